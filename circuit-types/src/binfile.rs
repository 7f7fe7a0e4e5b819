//! The binary container shared by circom artifacts: a four-byte magic, a
//! version, and a table of length-prefixed sections.

use std::collections::BTreeMap;
use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::ParseError;
use crate::reader_utils;

/// Offset and size of one section, as recorded in the section table.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Section {
    pub(crate) position: u64,
    pub(crate) size: u64,
}

/// A parsed section table over a seekable reader. Sections can be entered in
/// any order and any number of times.
pub(crate) struct BinFile<R> {
    version: u32,
    sections: BTreeMap<u32, Section>,
    reader: R,
}

impl<R: Read + Seek> BinFile<R> {
    pub(crate) fn new(magic: &str, mut reader: R) -> Result<Self, ParseError> {
        reader_utils::read_header(&mut reader, magic)?;
        let version = reader.read_u32::<LittleEndian>()?;
        let num_sections = reader.read_u32::<LittleEndian>()?;

        let mut sections = BTreeMap::new();
        for _ in 0..num_sections {
            let id = reader.read_u32::<LittleEndian>()?;
            let size = reader.read_u64::<LittleEndian>()?;
            let position = reader.stream_position()?;
            if sections.insert(id, Section { position, size }).is_some() {
                return Err(ParseError::DuplicateSection(id));
            }
            reader.seek(SeekFrom::Current(size as i64))?;
        }

        Ok(Self {
            version,
            sections,
            reader,
        })
    }

    pub(crate) fn version(&self) -> u32 {
        self.version
    }

    /// Positions the reader at the start of the section and returns its
    /// table entry.
    pub(crate) fn enter_section(&mut self, id: u32) -> Result<Section, ParseError> {
        let section = *self
            .sections
            .get(&id)
            .ok_or(ParseError::MissingSection(id))?;
        self.reader.seek(SeekFrom::Start(section.position))?;
        Ok(section)
    }

    pub(crate) fn reader(&mut self) -> &mut R {
        &mut self.reader
    }
}
