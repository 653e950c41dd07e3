//! C representation of the emitted BTF data. See,
//! https://www.kernel.org/doc/html/latest/bpf/btf.html
//!
//! Please use a packed C representation so mem::size_of can be used.
//! All multi-byte integers are written little-endian.

#![allow(non_camel_case_types)]

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::Result;

pub(crate) const BTF_MAGIC: u16 = 0xeb9f;
pub(crate) const BTF_VERSION: u8 = 1;

/// Max # of type identifiers.
pub(crate) const BTF_MAX_TYPE: u32 = 0xffff;
/// Max offset into the string section.
pub(crate) const BTF_MAX_NAME_OFFSET: u32 = 0xffff;
/// Max # of struct/union/enum members or func args.
pub(crate) const BTF_MAX_VLEN: u32 = 0xffff;

pub(crate) const BTF_KIND_UNKN: u32 = 0;
pub(crate) const BTF_KIND_INT: u32 = 1;
pub(crate) const BTF_KIND_PTR: u32 = 2;
pub(crate) const BTF_KIND_ARRAY: u32 = 3;
pub(crate) const BTF_KIND_STRUCT: u32 = 4;
pub(crate) const BTF_KIND_UNION: u32 = 5;
pub(crate) const BTF_KIND_ENUM: u32 = 6;
pub(crate) const BTF_KIND_FWD: u32 = 7;
pub(crate) const BTF_KIND_TYPEDEF: u32 = 8;
pub(crate) const BTF_KIND_VOLATILE: u32 = 9;
pub(crate) const BTF_KIND_CONST: u32 = 10;
pub(crate) const BTF_KIND_RESTRICT: u32 = 11;
pub(crate) const BTF_KIND_FUNC: u32 = 12;
pub(crate) const BTF_KIND_FUNC_PROTO: u32 = 13;

pub(crate) fn kind_str(kind: u32) -> &'static str {
    match kind {
        BTF_KIND_INT => "INT",
        BTF_KIND_PTR => "PTR",
        BTF_KIND_ARRAY => "ARRAY",
        BTF_KIND_STRUCT => "STRUCT",
        BTF_KIND_UNION => "UNION",
        BTF_KIND_ENUM => "ENUM",
        BTF_KIND_FWD => "FWD",
        BTF_KIND_TYPEDEF => "TYPEDEF",
        BTF_KIND_VOLATILE => "VOLATILE",
        BTF_KIND_CONST => "CONST",
        BTF_KIND_RESTRICT => "RESTRICT",
        BTF_KIND_FUNC => "FUNC",
        BTF_KIND_FUNC_PROTO => "FUNC_PROTO",
        _ => "UNKNOWN",
    }
}

pub(crate) const BTF_INT_SIGNED: u32 = 1 << 0;
pub(crate) const BTF_INT_CHAR: u32 = 1 << 1;
pub(crate) const BTF_INT_BOOL: u32 = 1 << 2;

/// Sentinel for base-type encodings BTF cannot express (floats etc.).
pub(crate) const BTF_INVALID_ENCODING: u32 = 0xff;

#[derive(Clone, Copy, Debug, Default)]
#[repr(C, packed)]
pub(crate) struct btf_header {
    pub(crate) magic: u16,
    pub(crate) version: u8,
    pub(crate) flags: u8,
    pub(crate) hdr_len: u32,
    // All offsets are in bytes relative to the end of this header.
    pub(crate) type_off: u32,
    pub(crate) type_len: u32,
    pub(crate) str_off: u32,
    pub(crate) str_len: u32,
}

impl btf_header {
    pub(crate) fn to_writer<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u16::<LittleEndian>(self.magic)?;
        w.write_u8(self.version)?;
        w.write_u8(self.flags)?;
        w.write_u32::<LittleEndian>(self.hdr_len)?;
        w.write_u32::<LittleEndian>(self.type_off)?;
        w.write_u32::<LittleEndian>(self.type_len)?;
        w.write_u32::<LittleEndian>(self.str_off)?;
        w.write_u32::<LittleEndian>(self.str_len)?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
#[repr(C, packed)]
pub(crate) struct btf_type {
    pub(crate) name_off: u32,
    // bits 0-15:  vlen
    // bits 16-23: unused
    // bits 24-27: kind
    // bits 28-30: unused
    // bit  31:    kind_flag
    pub(crate) info: u32,
    // union {
    //         _u32 size;
    //         _u32 type;
    // };
    pub(crate) size_type: u32,
}

impl btf_type {
    pub(crate) fn to_writer<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u32::<LittleEndian>(self.name_off)?;
        w.write_u32::<LittleEndian>(self.info)?;
        w.write_u32::<LittleEndian>(self.size_type)?;
        Ok(())
    }

    pub(crate) fn vlen(&self) -> u32 {
        self.info & 0xffff
    }

    pub(crate) fn kind(&self) -> u32 {
        (self.info >> 24) & 0x0f
    }
}

#[derive(Clone, Copy, Debug)]
#[repr(C, packed)]
pub(crate) struct btf_array {
    pub(crate) r#type: u32,
    pub(crate) index_type: u32,
    pub(crate) nelems: u32,
}

impl btf_array {
    pub(crate) fn to_writer<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u32::<LittleEndian>(self.r#type)?;
        w.write_u32::<LittleEndian>(self.index_type)?;
        w.write_u32::<LittleEndian>(self.nelems)?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
#[repr(C, packed)]
pub(crate) struct btf_member {
    pub(crate) name_off: u32,
    pub(crate) r#type: u32,
    pub(crate) offset: u32, // offset in bits
}

impl btf_member {
    pub(crate) fn to_writer<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u32::<LittleEndian>(self.name_off)?;
        w.write_u32::<LittleEndian>(self.r#type)?;
        w.write_u32::<LittleEndian>(self.offset)?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
#[repr(C, packed)]
pub(crate) struct btf_enum {
    pub(crate) name_off: u32,
    pub(crate) val: i32,
}

impl btf_enum {
    pub(crate) fn to_writer<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u32::<LittleEndian>(self.name_off)?;
        w.write_i32::<LittleEndian>(self.val)?;
        Ok(())
    }
}
