//! JAR signature records.
//!
//! A signed JAR carries `META-INF/<signer>.SF` files holding digests of the
//! manifest, plus one key block (`.RSA`, `.DSA`, `.EC` or `SIG-*`) per signer.
//! Any rewrite breaks those digests, so the whole record has to go.

use tracing::warn;

const SIGNATURE_DIR: &str = "META-INF/";

const SIGNATURE_EXTENSIONS: &[&str] = &["SF", "RSA", "DSA", "EC"];

/// `true` for signature files and key blocks directly under `META-INF/`.
pub fn is_signature_file(name: &str) -> bool {
    let Some(file_name) = strip_prefix_ignore_case(name, SIGNATURE_DIR) else {
        return false;
    };
    if file_name.is_empty() || file_name.contains('/') {
        return false;
    }
    if strip_prefix_ignore_case(file_name, "SIG-").is_some_and(|rest| !rest.is_empty()) {
        return true;
    }
    file_name.rsplit_once('.').is_some_and(|(stem, extension)| {
        !stem.is_empty()
            && SIGNATURE_EXTENSIONS
                .iter()
                .any(|known| extension.eq_ignore_ascii_case(known))
    })
}

/// The signature files found in one archive.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SignatureRecord {
    files: Vec<String>,
}

impl SignatureRecord {
    pub fn add(&mut self, name: impl Into<String>) {
        self.files.push(name.into());
    }

    pub fn is_signed(&self) -> bool {
        !self.files.is_empty()
    }

    /// Log the removal of every file in the record.
    pub fn report_removal(&self, archive: &str) {
        for file in &self.files {
            warn!("{archive}: removing signature file {file}, the archive is no longer signed");
        }
    }
}

fn strip_prefix_ignore_case<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let head = name.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &name[prefix.len()..])
}
