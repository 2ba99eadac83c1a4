//! Hand-assembled class files for unit tests.

use super::cpool::{
    TAG_CLASS, TAG_DOUBLE, TAG_INTEGER, TAG_LONG, TAG_METHODREF, TAG_NAME_AND_TYPE, TAG_STRING,
    TAG_UTF8,
};

pub struct ClassBuilder {
    pool: Vec<u8>,
    next: u16,
}

impl ClassBuilder {
    pub fn new() -> Self {
        ClassBuilder {
            pool: Vec::new(),
            next: 1,
        }
    }

    fn push(&mut self, tag: u8, body: &[u8], slots: u16) -> u16 {
        let index = self.next;
        self.pool.push(tag);
        self.pool.extend_from_slice(body);
        self.next += slots;
        index
    }

    pub fn utf8(&mut self, text: &str) -> u16 {
        let mut body = (text.len() as u16).to_be_bytes().to_vec();
        body.extend_from_slice(text.as_bytes());
        self.push(TAG_UTF8, &body, 1)
    }

    pub fn class(&mut self, name: &str) -> u16 {
        let name = self.utf8(name);
        self.push(TAG_CLASS, &name.to_be_bytes(), 1)
    }

    pub fn string(&mut self, text: &str) -> u16 {
        let text = self.utf8(text);
        self.push(TAG_STRING, &text.to_be_bytes(), 1)
    }

    pub fn integer(&mut self, value: i32) -> u16 {
        self.push(TAG_INTEGER, &value.to_be_bytes(), 1)
    }

    pub fn long(&mut self, value: i64) -> u16 {
        self.push(TAG_LONG, &value.to_be_bytes(), 2)
    }

    pub fn double(&mut self, value: f64) -> u16 {
        self.push(TAG_DOUBLE, &value.to_bits().to_be_bytes(), 2)
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        let mut body = name.to_be_bytes().to_vec();
        body.extend_from_slice(&descriptor.to_be_bytes());
        self.push(TAG_NAME_AND_TYPE, &body, 1)
    }

    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let owner = self.class(owner);
        let nat = self.name_and_type(name, descriptor);
        let mut body = owner.to_be_bytes().to_vec();
        body.extend_from_slice(&nat.to_be_bytes());
        self.push(TAG_METHODREF, &body, 1)
    }

    /// Finish with `fields` given as `(name, descriptor)` pool indices.
    pub fn build(self, this: u16, superclass: u16, fields: &[(u16, u16)]) -> Vec<u8> {
        let mut out = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52];
        out.extend_from_slice(&self.next.to_be_bytes());
        out.extend_from_slice(&self.pool);
        out.extend_from_slice(&0x0021u16.to_be_bytes());
        out.extend_from_slice(&this.to_be_bytes());
        out.extend_from_slice(&superclass.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&(fields.len() as u16).to_be_bytes());
        for (name, descriptor) in fields {
            out.extend_from_slice(&0x0002u16.to_be_bytes());
            out.extend_from_slice(&name.to_be_bytes());
            out.extend_from_slice(&descriptor.to_be_bytes());
            out.extend_from_slice(&0u16.to_be_bytes());
        }
        // methods, attributes
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out
    }
}
