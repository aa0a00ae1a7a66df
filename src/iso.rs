//! Minimal in-process ISO9660 image writer
//!
//! Produces a plain single-directory ISO9660 image: system area, primary
//! volume descriptor, descriptor set terminator, L/M path tables, one root
//! directory sector and the file extents. The three cloud-init filenames
//! fit ISO9660 constraints as-is, so no Joliet or Rock Ridge extensions
//! are emitted.

use chrono::{Datelike, Timelike, Utc};
use tracing::debug;

/// Logical sector size mandated by ISO9660
pub const SECTOR_SIZE: usize = 2048;

/// Default image-size guard
pub const DEFAULT_MAX_BYTES: u64 = 32 * 1024 * 1024;

// Fixed sector layout for a flat single-directory image.
const PVD_SECTOR: u32 = 16;
const TERMINATOR_SECTOR: u32 = 17;
const PATH_TABLE_L_SECTOR: u32 = 18;
const PATH_TABLE_M_SECTOR: u32 = 19;
const ROOT_DIR_SECTOR: u32 = 20;
const FIRST_FILE_SECTOR: u32 = 21;

/// Errors for ISO image construction
#[derive(Debug, thiserror::Error)]
pub enum IsoError {
    #[error("image size {actual_bytes} exceeds limit {limit_bytes}")]
    SizeExceeded { actual_bytes: u64, limit_bytes: u64 },

    #[error("volume identifier '{0}' exceeds 32 characters")]
    VolumeIdTooLong(String),

    #[error("root directory does not fit in a single sector ({0} bytes)")]
    DirectoryOverflow(usize),
}

struct IsoFile {
    name: String,
    data: Vec<u8>,
    extent: u32,
}

/// Builder for a flat ISO9660 image holding files in the root directory
pub struct IsoWriter {
    volume_id: String,
    files: Vec<IsoFile>,
    max_bytes: u64,
}

impl IsoWriter {
    pub fn new(volume_id: &str) -> Self {
        Self {
            volume_id: volume_id.to_string(),
            files: Vec::new(),
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }

    /// Set the maximum image size in bytes; 0 means no limit
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Add a file to the root directory
    pub fn add_file(&mut self, name: &str, data: Vec<u8>) {
        self.files.push(IsoFile {
            name: name.to_string(),
            data,
            extent: 0,
        });
    }

    /// Build the image in memory
    pub fn build(mut self) -> Result<Vec<u8>, IsoError> {
        if self.volume_id.len() > 32 {
            return Err(IsoError::VolumeIdTooLong(self.volume_id));
        }

        // ISO9660 requires directory entries in sorted order.
        self.files.sort_by(|a, b| a.name.cmp(&b.name));

        // Assign file extents after the fixed metadata sectors.
        let mut next_sector = FIRST_FILE_SECTOR;
        for file in &mut self.files {
            file.extent = next_sector;
            next_sector += sectors_for(file.data.len());
        }

        let total_sectors = next_sector;
        let actual_bytes = total_sectors as u64 * SECTOR_SIZE as u64;
        if self.max_bytes > 0 && actual_bytes > self.max_bytes {
            return Err(IsoError::SizeExceeded {
                actual_bytes,
                limit_bytes: self.max_bytes,
            });
        }

        let root_dir = self.root_dir_sector()?;
        debug!(
            files = self.files.len(),
            sectors = total_sectors,
            volume_id = %self.volume_id,
            "building ISO image"
        );

        let mut image = vec![0u8; total_sectors as usize * SECTOR_SIZE];
        write_sector(&mut image, PVD_SECTOR, &self.primary_volume_descriptor(total_sectors, &root_dir));
        write_sector(&mut image, TERMINATOR_SECTOR, &terminator_descriptor());
        write_sector(&mut image, PATH_TABLE_L_SECTOR, &path_table(true));
        write_sector(&mut image, PATH_TABLE_M_SECTOR, &path_table(false));
        write_sector(&mut image, ROOT_DIR_SECTOR, &root_dir);
        for file in &self.files {
            write_sector(&mut image, file.extent, &file.data);
        }

        Ok(image)
    }

    /// Root directory contents: self, parent, then one record per file
    fn root_dir_sector(&self) -> Result<Vec<u8>, IsoError> {
        let now = recording_date();
        let mut sector = Vec::with_capacity(SECTOR_SIZE);
        // 0x00 and 0x01 are the conventional names for self and parent.
        sector.extend_from_slice(&dir_record(ROOT_DIR_SECTOR, SECTOR_SIZE as u32, 0x02, &[0x00], &now));
        sector.extend_from_slice(&dir_record(ROOT_DIR_SECTOR, SECTOR_SIZE as u32, 0x02, &[0x01], &now));
        for file in &self.files {
            sector.extend_from_slice(&dir_record(
                file.extent,
                file.data.len() as u32,
                0x00,
                file.name.as_bytes(),
                &now,
            ));
        }
        if sector.len() > SECTOR_SIZE {
            return Err(IsoError::DirectoryOverflow(sector.len()));
        }
        Ok(sector)
    }

    fn primary_volume_descriptor(&self, total_sectors: u32, root_dir: &[u8]) -> Vec<u8> {
        let mut pvd = vec![0u8; SECTOR_SIZE];
        pvd[0] = 1; // type: primary
        pvd[1..6].copy_from_slice(b"CD001");
        pvd[6] = 1; // version

        fill_spaces(&mut pvd[8..40]); // system identifier
        fill_spaces(&mut pvd[40..72]); // volume identifier
        pvd[40..40 + self.volume_id.len()].copy_from_slice(self.volume_id.as_bytes());

        both_u32(&mut pvd[80..88], total_sectors); // volume space size
        both_u16(&mut pvd[120..124], 1); // volume set size
        both_u16(&mut pvd[124..128], 1); // volume sequence number
        both_u16(&mut pvd[128..132], SECTOR_SIZE as u16); // logical block size

        let pt = path_table(true);
        both_u32(&mut pvd[132..140], pt.len() as u32); // path table size
        pvd[140..144].copy_from_slice(&PATH_TABLE_L_SECTOR.to_le_bytes());
        pvd[148..152].copy_from_slice(&PATH_TABLE_M_SECTOR.to_be_bytes());

        // Root directory record, truncated to the fixed 34-byte slot.
        pvd[156..190].copy_from_slice(&root_dir[..34]);

        fill_spaces(&mut pvd[190..318]); // volume set identifier
        fill_spaces(&mut pvd[318..446]); // publisher
        fill_spaces(&mut pvd[446..574]); // data preparer
        fill_spaces(&mut pvd[574..702]); // application
        fill_spaces(&mut pvd[702..739]); // copyright file
        fill_spaces(&mut pvd[739..776]); // abstract file
        fill_spaces(&mut pvd[776..813]); // bibliographic file

        let now = decimal_datetime();
        pvd[813..830].copy_from_slice(&now); // creation
        pvd[830..847].copy_from_slice(&now); // modification
        pvd[847..864].copy_from_slice(&zero_decimal_datetime()); // expiration
        pvd[864..881].copy_from_slice(&now); // effective

        pvd[881] = 1; // file structure version
        pvd
    }
}

/// Directory record per ECMA-119 §9.1; padded to an even length
fn dir_record(extent: u32, size: u32, flags: u8, name: &[u8], date: &[u8; 7]) -> Vec<u8> {
    let mut len = 33 + name.len();
    if len % 2 != 0 {
        len += 1;
    }
    let mut rec = Vec::with_capacity(len);
    rec.push(len as u8);
    rec.push(0); // extended attribute record length
    let mut extent_be = [0u8; 8];
    both_u32(&mut extent_be, extent);
    rec.extend_from_slice(&extent_be);
    let mut size_be = [0u8; 8];
    both_u32(&mut size_be, size);
    rec.extend_from_slice(&size_be);
    rec.extend_from_slice(date);
    rec.push(flags);
    rec.push(0); // file unit size
    rec.push(0); // interleave gap
    let mut seq = [0u8; 4];
    both_u16(&mut seq, 1);
    rec.extend_from_slice(&seq);
    rec.push(name.len() as u8);
    rec.extend_from_slice(name);
    rec.resize(len, 0);
    rec
}

fn terminator_descriptor() -> Vec<u8> {
    let mut term = vec![0u8; SECTOR_SIZE];
    term[0] = 255; // type: set terminator
    term[1..6].copy_from_slice(b"CD001");
    term[6] = 1;
    term
}

/// Path table with the single root entry
fn path_table(little_endian: bool) -> Vec<u8> {
    let mut pt = Vec::with_capacity(10);
    pt.push(1); // directory identifier length
    pt.push(0); // extended attribute record length
    if little_endian {
        pt.extend_from_slice(&ROOT_DIR_SECTOR.to_le_bytes());
        pt.extend_from_slice(&1u16.to_le_bytes()); // parent: root itself
    } else {
        pt.extend_from_slice(&ROOT_DIR_SECTOR.to_be_bytes());
        pt.extend_from_slice(&1u16.to_be_bytes());
    }
    pt.push(0); // root directory identifier
    pt.push(0); // pad to even length
    pt
}

/// ECMA-119 §9.1.5 recording date: offset from 1900, then month..second
fn recording_date() -> [u8; 7] {
    let now = Utc::now();
    [
        (now.year() - 1900) as u8,
        now.month() as u8,
        now.day() as u8,
        now.hour() as u8,
        now.minute() as u8,
        now.second() as u8,
        0, // GMT offset
    ]
}

/// ECMA-119 §8.4.26.1 17-byte decimal datetime
fn decimal_datetime() -> [u8; 17] {
    let mut out = [0u8; 17];
    let now = Utc::now().format("%Y%m%d%H%M%S00").to_string();
    out[..16].copy_from_slice(now.as_bytes());
    out
}

fn zero_decimal_datetime() -> [u8; 17] {
    let mut out = [b'0'; 17];
    out[16] = 0;
    out
}

fn sectors_for(bytes: usize) -> u32 {
    (bytes.div_ceil(SECTOR_SIZE)) as u32
}

fn write_sector(image: &mut [u8], sector: u32, data: &[u8]) {
    let start = sector as usize * SECTOR_SIZE;
    image[start..start + data.len()].copy_from_slice(data);
}

fn fill_spaces(slice: &mut [u8]) {
    slice.fill(b' ');
}

fn both_u32(slice: &mut [u8], value: u32) {
    slice[..4].copy_from_slice(&value.to_le_bytes());
    slice[4..8].copy_from_slice(&value.to_be_bytes());
}

fn both_u16(slice: &mut [u8], value: u16) {
    slice[..2].copy_from_slice(&value.to_le_bytes());
    slice[2..4].copy_from_slice(&value.to_be_bytes());
}
