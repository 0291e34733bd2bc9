//! In-memory IWAD/PWAD access, enough to pull music lumps out of a WAD.

use anyhow::{Context, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::{
    collections::HashMap,
    io::{Cursor, Read},
};

/// Lump name prefixes used for music in DOOM-engine WADs.
pub const MUSIC_PREFIXES: &[&str] = &["D_", "MUS_"];

const WAD_HEADER_SIZE: usize = 12;
const DIR_ENTRY_SIZE: usize = 16;

#[derive(thiserror::Error, Debug)]
pub enum WadError {
    #[error("not a WAD file")]
    NotAWad,
    #[error("lump not found: {0}")]
    LumpNotFound(String),
    #[error("lump {0} points outside the WAD")]
    LumpOutOfBounds(String),
}

/// WAD directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lump {
    pub name: String, // upper ASCII, trailing NULs stripped
    pub filepos: u32,
    pub size: u32,
}

/// A parsed WAD borrowing its bytes.
/// Names can repeat; the index keeps the first lump for each name.
#[derive(Debug)]
pub struct Wad<'a> {
    data: &'a [u8],
    lumps: Vec<Lump>,
    index: HashMap<String, usize>,
}

impl<'a> Wad<'a> {
    /// True if `bytes` start with an IWAD or PWAD identifier.
    pub fn sniff(bytes: &[u8]) -> bool {
        bytes.starts_with(b"IWAD") || bytes.starts_with(b"PWAD")
    }

    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if !Self::sniff(data) || data.len() < WAD_HEADER_SIZE {
            return Err(WadError::NotAWad.into());
        }

        // Header: ident[4], numlumps[4], infotableofs[4]
        let mut rdr = Cursor::new(&data[4..WAD_HEADER_SIZE]);
        let numlumps = rdr.read_u32::<LittleEndian>()? as usize;
        let infoofs = rdr.read_u32::<LittleEndian>()? as usize;

        let dir_len = numlumps
            .checked_mul(DIR_ENTRY_SIZE)
            .and_then(|n| n.checked_add(infoofs))
            .filter(|&end| end <= data.len())
            .with_context(|| format!("directory of {numlumps} lumps at {infoofs} is truncated"))?
            - infoofs;

        // Directory: numlumps entries of { filepos[4], size[4], name[8] }
        let mut rdr = Cursor::new(&data[infoofs..infoofs + dir_len]);
        let mut lumps = Vec::with_capacity(numlumps);
        let mut index = HashMap::new();
        for i in 0..numlumps {
            let filepos = rdr.read_u32::<LittleEndian>()?;
            let size = rdr.read_u32::<LittleEndian>()?;
            let mut raw = [0u8; 8];
            rdr.read_exact(&mut raw)?;
            let name = lump_name(&raw);
            index.entry(name.clone()).or_insert(i);
            lumps.push(Lump { name, filepos, size });
        }

        Ok(Self { data, lumps, index })
    }

    pub fn len(&self) -> usize {
        self.lumps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lumps.is_empty()
    }

    pub fn lumps(&self) -> &[Lump] {
        &self.lumps
    }

    /// First lump with this name, case-insensitive.
    pub fn find(&self, name: &str) -> Option<&Lump> {
        self.index.get(&name.to_ascii_uppercase()).map(|&i| &self.lumps[i])
    }

    /// Borrow a lump's bytes.
    pub fn read(&self, name: &str) -> Result<&'a [u8]> {
        let lump = self
            .find(name)
            .ok_or_else(|| WadError::LumpNotFound(name.to_string()))?;
        let start = lump.filepos as usize;
        let end = start + lump.size as usize;
        self.data
            .get(start..end)
            .ok_or_else(|| WadError::LumpOutOfBounds(lump.name.clone()).into())
    }

    pub fn music_lumps(&self) -> impl Iterator<Item = &Lump> + '_ {
        self.lumps
            .iter()
            .filter(|l| MUSIC_PREFIXES.iter().any(|p| l.name.starts_with(p)))
    }

    /// Accepts RUNNIN, D_RUNNIN, E1M1, MUS_E1M1, etc.
    /// Tries the exact name, then each music prefix.
    pub fn find_song(&self, query: &str) -> Option<&Lump> {
        let q = query.trim().to_ascii_uppercase();
        if q.is_empty() {
            return None;
        }
        self.find(&q).or_else(|| {
            MUSIC_PREFIXES
                .iter()
                .find_map(|p| self.find(&format!("{p}{q}")))
        })
    }
}

fn lump_name(b: &[u8; 8]) -> String {
    let s = b.split(|&c| c == 0).next().unwrap_or(b);
    String::from_utf8_lossy(s).to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a WAD holding `lumps` back to back after the header.
    fn make_wad(lumps: &[(&str, &[u8])]) -> Vec<u8> {
        let data_len: usize = lumps.iter().map(|(_, d)| d.len()).sum();
        let dir_ofs = (WAD_HEADER_SIZE + data_len) as u32;

        let mut wad = b"IWAD".to_vec();
        wad.extend_from_slice(&(lumps.len() as u32).to_le_bytes());
        wad.extend_from_slice(&dir_ofs.to_le_bytes());
        for (_, data) in lumps {
            wad.extend_from_slice(data);
        }

        let mut pos = WAD_HEADER_SIZE as u32;
        for (name, data) in lumps {
            wad.extend_from_slice(&pos.to_le_bytes());
            wad.extend_from_slice(&(data.len() as u32).to_le_bytes());
            let mut raw = [0u8; 8];
            raw[..name.len()].copy_from_slice(name.as_bytes());
            wad.extend_from_slice(&raw);
            pos += data.len() as u32;
        }
        wad
    }

    #[test]
    fn parses_directory() {
        let bytes = make_wad(&[("HELLO", &b"hello"[..]), ("D_TEST", &b"MUS\x1A"[..])]);
        let wad = Wad::parse(&bytes).unwrap();
        assert_eq!(wad.len(), 2);
        assert_eq!(wad.lumps()[1].name, "D_TEST");
        assert_eq!(wad.read("hello").unwrap(), b"hello");
        assert_eq!(wad.music_lumps().count(), 1);
    }

    #[test]
    fn finds_songs_by_short_name() {
        let bytes = make_wad(&[("D_RUNNIN", &b"x"[..]), ("MUS_E1M1", &b"y"[..])]);
        let wad = Wad::parse(&bytes).unwrap();
        assert_eq!(wad.find_song("runnin").unwrap().name, "D_RUNNIN");
        assert_eq!(wad.find_song("D_RUNNIN").unwrap().name, "D_RUNNIN");
        assert_eq!(wad.find_song("e1m1").unwrap().name, "MUS_E1M1");
        assert!(wad.find_song("  ").is_none());
        assert!(wad.find_song("nope").is_none());
    }

    #[test]
    fn bad_header_is_rejected() {
        let err = Wad::parse(b"XXXX\0\0\0\0\0\0\0\0").unwrap_err();
        assert!(format!("{err}").contains("not a WAD file"));
    }

    #[test]
    fn truncated_directory_is_rejected() {
        let mut bytes = make_wad(&[("D_TEST", &b"abc"[..])]);
        bytes.truncate(bytes.len() - 4);
        assert!(Wad::parse(&bytes).is_err());
    }

    #[test]
    fn lump_past_end_is_rejected() {
        let mut bytes = make_wad(&[("D_TEST", &b"abc"[..])]);
        // Bump the lump size beyond the file.
        let size_at = bytes.len() - 12;
        bytes[size_at..size_at + 4].copy_from_slice(&1000u32.to_le_bytes());
        let wad = Wad::parse(&bytes).unwrap();
        let err = wad.read("D_TEST").unwrap_err();
        assert!(format!("{err}").contains("outside the WAD"));
    }
}
