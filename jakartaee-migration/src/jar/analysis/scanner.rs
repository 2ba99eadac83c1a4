use std::path::Path;

use strum_macros::Display;

use crate::jar::core::looks_like_class;
use crate::jar::modification::{is_signature_file, rewrite_str, MANIFEST_NAME};
use crate::mapping::MappingTable;
use crate::types::ArtifactKind;

pub const SERVICES_DIR: &str = "META-INF/services/";

/// Roots under which entry paths mirror package names.
const CLASS_ROOTS: &[&str] = &[SERVICES_DIR, "WEB-INF/classes/", "BOOT-INF/classes/"];

// Multi-release JARs keep versioned classes under META-INF/versions/<n>/
const VERSIONS_DIR: &str = "META-INF/versions/";

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

const ARCHIVE_EXTENSIONS: &[&str] = &["jar", "war", "ear", "rar", "zip"];

const TEXT_EXTENSIONS: &[&str] = &[
    "java", "jsp", "jspf", "jspx", "tag", "tagf", "tagx", "tld", "txt", "xml", "xsd", "json",
    "properties", "groovy", "kt", "scala", "html", "htm", "xhtml", "conf", "yaml", "yml",
];

/// How an archive entry is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EntryKind {
    Directory,
    ClassBinary,
    Manifest,
    Signature,
    ServiceRegistration,
    NestedArchive,
    SourceText,
    Passthrough,
}

/// Routing decision for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub kind: EntryKind,
    /// New entry name, when the name itself refers to a mapped package.
    pub rename_to: Option<String>,
}

/// Decide how an entry is handled and whether its name moves.
pub fn classify(name: &str, payload: &[u8], table: &MappingTable) -> Route {
    let kind = entry_kind(name, payload);
    let rename_to = match kind {
        EntryKind::Manifest | EntryKind::Signature => None,
        _ => renamed_entry(name, table),
    };
    Route { kind, rename_to }
}

pub fn entry_kind(name: &str, payload: &[u8]) -> EntryKind {
    if name.ends_with('/') {
        return EntryKind::Directory;
    }
    if name.ends_with(".class") || looks_like_class(payload) {
        return EntryKind::ClassBinary;
    }
    if name.eq_ignore_ascii_case(MANIFEST_NAME) {
        return EntryKind::Manifest;
    }
    if is_signature_file(name) {
        return EntryKind::Signature;
    }
    if name.starts_with(SERVICES_DIR) {
        return EntryKind::ServiceRegistration;
    }
    if is_archive_name(name) {
        return EntryKind::NestedArchive;
    }
    if is_text_name(name) {
        return EntryKind::SourceText;
    }
    EntryKind::Passthrough
}

/// The entry path with its package-shaped part rewritten.
///
/// Below a known class root only the part after the root is considered, so
/// `META-INF/services/javax.servlet.ServletContainerInitializer` and
/// `WEB-INF/classes/javax/servlet/Foo.class` both move while the roots stay.
pub fn renamed_entry(name: &str, table: &MappingTable) -> Option<String> {
    let root = class_root_len(name);
    let tail = rewrite_str(&name[root..], table)?;
    Some(format!("{}{}", &name[..root], tail))
}

fn class_root_len(name: &str) -> usize {
    if let Some(root) = CLASS_ROOTS.iter().find(|root| name.starts_with(*root)) {
        return root.len();
    }
    if let Some(rest) = name.strip_prefix(VERSIONS_DIR) {
        if let Some((version, _)) = rest.split_once('/') {
            if !version.is_empty() && version.bytes().all(|b| b.is_ascii_digit()) {
                return VERSIONS_DIR.len() + version.len() + 1;
            }
        }
    }
    0
}

/// Sniff a stand-alone file by name and leading bytes.
pub fn sniff_file(path: &Path, head: &[u8]) -> ArtifactKind {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();

    if is_archive_name(&name) || head.starts_with(ZIP_MAGIC) {
        ArtifactKind::Archive
    } else if name.ends_with(".class") || looks_like_class(head) {
        ArtifactKind::ClassBinary
    } else if name.eq_ignore_ascii_case("MANIFEST.MF") {
        ArtifactKind::Manifest
    } else if is_text_name(&name) || is_service_file(path) {
        ArtifactKind::SourceText
    } else {
        ArtifactKind::Passthrough
    }
}

// an exploded META-INF/services/<interface> file
fn is_service_file(path: &Path) -> bool {
    let Some(services) = path.parent() else {
        return false;
    };
    services.file_name().is_some_and(|name| name == "services")
        && services
            .parent()
            .and_then(Path::file_name)
            .is_some_and(|name| name == "META-INF")
}

pub fn is_archive_name(name: &str) -> bool {
    has_extension(name, ARCHIVE_EXTENSIONS)
}

pub fn is_text_name(name: &str) -> bool {
    has_extension(name, TEXT_EXTENSIONS)
}

fn has_extension(name: &str, extensions: &[&str]) -> bool {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    file_name.rsplit_once('.').is_some_and(|(stem, extension)| {
        !stem.is_empty() && extensions.iter().any(|known| extension.eq_ignore_ascii_case(known))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jar::core::fixture::ClassBuilder;
    use crate::profile::Profile;
    use rstest::rstest;

    #[rstest]
    #[case("org/", EntryKind::Directory)]
    #[case("org/example/Hello.class", EntryKind::ClassBinary)]
    #[case("META-INF/MANIFEST.MF", EntryKind::Manifest)]
    #[case("META-INF/RSA.SF", EntryKind::Signature)]
    #[case("META-INF/RSA.RSA", EntryKind::Signature)]
    #[case(
        "META-INF/services/javax.servlet.ServletContainerInitializer",
        EntryKind::ServiceRegistration
    )]
    #[case("WEB-INF/lib/cgi-api.jar", EntryKind::NestedArchive)]
    #[case("WEB-INF/web.xml", EntryKind::SourceText)]
    #[case("index.jsp", EntryKind::SourceText)]
    #[case("org/example/LocalStrings.properties", EntryKind::SourceText)]
    #[case("images/logo.png", EntryKind::Passthrough)]
    #[case("README", EntryKind::Passthrough)]
    fn classifies_by_name(#[case] name: &str, #[case] expected: EntryKind) {
        assert_eq!(entry_kind(name, b""), expected);
    }

    #[test]
    fn classifies_class_by_magic() {
        let mut builder = ClassBuilder::new();
        let this = builder.class("a/B");
        let sup = builder.class("java/lang/Object");
        let class = builder.build(this, sup, &[]);
        assert_eq!(entry_kind("a/B.bin", &class), EntryKind::ClassBinary);

        let fat_binary = [0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 2];
        assert_eq!(entry_kind("bin/tool", &fat_binary), EntryKind::Passthrough);
    }

    #[rstest]
    #[case(
        "META-INF/services/javax.enterprise.inject.spi.Extension",
        Some("META-INF/services/jakarta.enterprise.inject.spi.Extension")
    )]
    #[case(
        "javax.enterprise.inject.spi.Extension",
        Some("jakarta.enterprise.inject.spi.Extension")
    )]
    #[case("javax/servlet/Servlet.class", Some("jakarta/servlet/Servlet.class"))]
    #[case("javax/servlet/", Some("jakarta/servlet/"))]
    #[case(
        "WEB-INF/classes/javax/servlet/Servlet.class",
        Some("WEB-INF/classes/jakarta/servlet/Servlet.class")
    )]
    #[case(
        "META-INF/versions/11/javax/servlet/Servlet.class",
        Some("META-INF/versions/11/jakarta/servlet/Servlet.class")
    )]
    #[case("org/example/Hello.class", None)]
    #[case("javax/xml/parsers/Foo.class", None)]
    fn renames_package_shaped_paths(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(renamed_entry(name, Profile::Ee.table()).as_deref(), expected);
    }

    #[test]
    fn service_file_keeps_name_under_tomcat() {
        let route = classify(
            "META-INF/services/javax.enterprise.inject.spi.Extension",
            b"some.class.Reference\n",
            Profile::Tomcat.table(),
        );
        assert_eq!(route.kind, EntryKind::ServiceRegistration);
        assert_eq!(route.rename_to, None);
    }

    #[test]
    fn manifest_is_never_renamed() {
        let route = classify(MANIFEST_NAME, b"", Profile::Ee.table());
        assert_eq!(
            route,
            Route {
                kind: EntryKind::Manifest,
                rename_to: None
            }
        );
    }

    #[rstest]
    #[case("app.war", b"PK\x03\x04".as_slice(), ArtifactKind::Archive)]
    #[case("app.bin", b"PK\x03\x04".as_slice(), ArtifactKind::Archive)]
    #[case("HelloServlet.java", b"package".as_slice(), ArtifactKind::SourceText)]
    #[case("MANIFEST.MF", b"Manifest".as_slice(), ArtifactKind::Manifest)]
    #[case("HelloCGI.class", b"".as_slice(), ArtifactKind::ClassBinary)]
    #[case("logo.png", b"\x89PNG".as_slice(), ArtifactKind::Passthrough)]
    fn sniffs_files(#[case] name: &str, #[case] head: &[u8], #[case] expected: ArtifactKind) {
        assert_eq!(sniff_file(Path::new(name), head), expected);
    }

    #[test]
    fn exploded_service_files_are_text() {
        let path = Path::new("webapp/META-INF/services/javax.servlet.ServletContainerInitializer");
        assert_eq!(sniff_file(path, b"org."), ArtifactKind::SourceText);
        let loose = Path::new("javax.enterprise.inject.spi.Extension");
        assert_eq!(sniff_file(loose, b"some"), ArtifactKind::Passthrough);
    }
}
