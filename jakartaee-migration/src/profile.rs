//! Built-in migration profiles.
//!
//! A profile is a closed, named selection of packages to move from `javax` to
//! `jakarta`. `TOMCAT` covers what a servlet container needs; `EE` adds the
//! rest of the Jakarta EE specifications.

use std::sync::LazyLock;

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::mapping::MappingTable;

// JDK-owned sub-packages that stay under javax
const EXCLUSIONS: &[(&str, &str)] = &[
    ("javax.annotation.processing", "javax.annotation.processing"),
    ("javax.transaction.xa", "javax.transaction.xa"),
];

pub const TOMCAT_MAPPING: &[(&str, &str)] = &[
    ("javax.annotation", "jakarta.annotation"),
    ("javax.ejb", "jakarta.ejb"),
    ("javax.el", "jakarta.el"),
    ("javax.mail", "jakarta.mail"),
    ("javax.persistence", "jakarta.persistence"),
    ("javax.security.auth.message", "jakarta.security.auth.message"),
    ("javax.servlet", "jakarta.servlet"),
    ("javax.transaction", "jakarta.transaction"),
    ("javax.websocket", "jakarta.websocket"),
];

pub const EE_MAPPING: &[(&str, &str)] = &[
    ("javax.activation", "jakarta.activation"),
    ("javax.batch", "jakarta.batch"),
    ("javax.decorator", "jakarta.decorator"),
    ("javax.enterprise", "jakarta.enterprise"),
    ("javax.faces", "jakarta.faces"),
    ("javax.inject", "jakarta.inject"),
    ("javax.interceptor", "jakarta.interceptor"),
    ("javax.jms", "jakarta.jms"),
    ("javax.json", "jakarta.json"),
    ("javax.jws", "jakarta.jws"),
    ("javax.resource", "jakarta.resource"),
    ("javax.security.enterprise", "jakarta.security.enterprise"),
    ("javax.security.jacc", "jakarta.security.jacc"),
    ("javax.validation", "jakarta.validation"),
    ("javax.ws.rs", "jakarta.ws.rs"),
    ("javax.xml.bind", "jakarta.xml.bind"),
    ("javax.xml.soap", "jakarta.xml.soap"),
    ("javax.xml.ws", "jakarta.xml.ws"),
];

static TOMCAT_TABLE: LazyLock<MappingTable> =
    LazyLock::new(|| MappingTable::from_static(&Profile::Tomcat.raw_rules()));

static EE_TABLE: LazyLock<MappingTable> =
    LazyLock::new(|| MappingTable::from_static(&Profile::Ee.raw_rules()));

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter, EnumString,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Profile {
    #[default]
    Tomcat,
    Ee,
}

impl Profile {
    /// The lookup table for this profile, built on first use.
    pub fn table(&self) -> &'static MappingTable {
        match self {
            Profile::Tomcat => &TOMCAT_TABLE,
            Profile::Ee => &EE_TABLE,
        }
    }

    fn raw_rules(&self) -> Vec<(&'static str, &'static str)> {
        let mut rules = EXCLUSIONS.to_vec();
        rules.extend_from_slice(TOMCAT_MAPPING);
        if matches!(self, Profile::Ee) {
            rules.extend_from_slice(EE_MAPPING);
        }
        rules
    }
}
