//! Builders for the class files and archives the integration tests migrate.

#![allow(dead_code)]

use std::{
    fs,
    io::{Cursor, Read, Write},
    path::Path,
};

use jakartaee_migration::jar::ClassFile;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

pub const HELLO_SERVLET: &str = "package org.apache.tomcat.jakartaee;\n\
    \n\
    import java.io.IOException;\n\
    import javax.servlet.ServletException;\n\
    import javax.servlet.http.HttpServlet;\n\
    import javax.servlet.http.HttpServletRequest;\n\
    import javax.servlet.http.HttpServletResponse;\n\
    \n\
    public class HelloServlet extends HttpServlet {\n\
    }\n";

pub const HELLO_CGI: &str = "org/apache/tomcat/jakartaee/HelloCGI";
pub const HELLO_CGI_CLASS: &str = "org/apache/tomcat/jakartaee/HelloCGI.class";

/// A minimal class `this extends superclass` with extra string constants.
pub fn class_bytes(this: &str, superclass: &str, strings: &[&str]) -> Vec<u8> {
    let mut pool = Vec::new();
    let mut next: u16 = 1;
    let mut utf8 = |pool: &mut Vec<u8>, text: &str| -> u16 {
        pool.push(1);
        pool.extend_from_slice(&(text.len() as u16).to_be_bytes());
        pool.extend_from_slice(text.as_bytes());
        next += 1;
        next - 1
    };

    let this_name = utf8(&mut pool, this);
    let super_name = utf8(&mut pool, superclass);
    let mut string_names = Vec::new();
    for text in strings {
        string_names.push(utf8(&mut pool, text));
    }

    let mut next_index = next;
    let mut push_ref = |pool: &mut Vec<u8>, tag: u8, target: u16| -> u16 {
        pool.push(tag);
        pool.extend_from_slice(&target.to_be_bytes());
        next_index += 1;
        next_index - 1
    };
    let this_class = push_ref(&mut pool, 7, this_name);
    let super_class = push_ref(&mut pool, 7, super_name);
    for name in string_names {
        push_ref(&mut pool, 8, name);
    }

    let mut out = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52];
    out.extend_from_slice(&next_index.to_be_bytes());
    out.extend_from_slice(&pool);
    out.extend_from_slice(&0x0021u16.to_be_bytes());
    out.extend_from_slice(&this_class.to_be_bytes());
    out.extend_from_slice(&super_class.to_be_bytes());
    // interfaces, fields, methods, attributes
    out.extend_from_slice(&[0; 8]);
    out
}

pub fn hello_cgi_class() -> Vec<u8> {
    class_bytes(
        HELLO_CGI,
        "javax/servlet/CommonGatewayInterface",
        &["javax.servlet.http.LocalStrings"],
    )
}

/// All `Utf8` constants of a class, in pool order.
pub fn utf8_constants(class: &[u8]) -> Vec<String> {
    let parsed = ClassFile::parse(class).expect("valid class file");
    parsed
        .pool
        .utf8_entries()
        .map(|(_, bytes)| String::from_utf8_lossy(bytes).into_owned())
        .collect()
}

#[derive(Default)]
pub struct JarBuilder {
    entries: Vec<(String, Vec<u8>, CompressionMethod)>,
}

impl JarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, name: &str, bytes: impl AsRef<[u8]>) -> Self {
        self.entries.push((
            name.to_owned(),
            bytes.as_ref().to_vec(),
            CompressionMethod::Deflated,
        ));
        self
    }

    pub fn stored(mut self, name: &str, bytes: impl AsRef<[u8]>) -> Self {
        self.entries.push((
            name.to_owned(),
            bytes.as_ref().to_vec(),
            CompressionMethod::Stored,
        ));
        self
    }

    pub fn dir(mut self, name: &str) -> Self {
        self.entries
            .push((name.to_owned(), Vec::new(), CompressionMethod::Stored));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes, method) in self.entries {
            let options = SimpleFileOptions::default().compression_method(method);
            if name.ends_with('/') {
                writer.add_directory(name, options).expect("add directory");
            } else {
                writer.start_file(name, options).expect("start file");
                writer.write_all(&bytes).expect("write entry");
            }
        }
        writer.finish().expect("finish jar").into_inner()
    }

    pub fn write_to(self, path: &Path) {
        fs::write(path, self.build()).expect("write jar");
    }
}

/// The `hellocgi.jar` layout: a manifest, one class and a resource.
pub fn hello_cgi_jar() -> JarBuilder {
    JarBuilder::new()
        .entry(
            "META-INF/MANIFEST.MF",
            "Manifest-Version: 1.0\r\nImplementation-Version: 1.2.3\r\n\r\n",
        )
        .dir("org/")
        .dir("org/apache/")
        .entry(HELLO_CGI_CLASS, hello_cgi_class())
        .stored("org/apache/tomcat/jakartaee/logo.png", b"\x89PNG\r\n\x1a\n")
}

/// The same jar signed by one signer using `algorithm` (`RSA`, `DSA`, `EC`).
pub fn signed_hello_cgi_jar(algorithm: &str) -> JarBuilder {
    let manifest = format!(
        "Manifest-Version: 1.0\r\n\
         Implementation-Version: 1.2.3\r\n\
         \r\n\
         Name: {HELLO_CGI_CLASS}\r\n\
         SHA-256-Digest: 47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=\r\n\
         \r\n"
    );
    JarBuilder::new()
        .entry("META-INF/MANIFEST.MF", manifest)
        .entry(
            &format!("META-INF/{algorithm}.SF"),
            "Signature-Version: 1.0\r\nSHA-256-Digest-Manifest: AAAA\r\n\r\n",
        )
        .entry(&format!("META-INF/{algorithm}.{algorithm}"), b"\x30\x82\x01\x00")
        .entry(HELLO_CGI_CLASS, hello_cgi_class())
}

/// Entry names and contents, in archive order.
pub fn read_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    (0..archive.len())
        .map(|index| {
            let mut file = archive.by_index(index).expect("entry");
            let mut content = Vec::new();
            file.read_to_end(&mut content).expect("read entry");
            (file.name().to_owned(), content)
        })
        .collect()
}

/// An entry as stored in the archive, before decompression.
pub struct RawEntry {
    pub name: String,
    pub compression: CompressionMethod,
    pub data: Vec<u8>,
}

pub fn read_raw_entries(bytes: &[u8]) -> Vec<RawEntry> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    (0..archive.len())
        .map(|index| {
            let mut file = archive.by_index_raw(index).expect("entry");
            let mut data = Vec::new();
            file.read_to_end(&mut data).expect("read raw entry");
            RawEntry {
                name: file.name().to_owned(),
                compression: file.compression(),
                data,
            }
        })
        .collect()
}

pub fn read_jar(path: &Path) -> Vec<(String, Vec<u8>)> {
    read_entries(&fs::read(path).expect("read jar"))
}

pub fn entry<'a>(entries: &'a [(String, Vec<u8>)], name: &str) -> Option<&'a [u8]> {
    entries
        .iter()
        .find(|(entry, _)| entry == name)
        .map(|(_, content)| content.as_slice())
}

pub fn entry_text(entries: &[(String, Vec<u8>)], name: &str) -> Option<String> {
    entry(entries, name).map(|bytes| String::from_utf8_lossy(bytes).into_owned())
}
