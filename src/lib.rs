//! Translation of DWARF debugging information entries (DIEs) into the BPF
//! Type Format (BTF), the compact binary type description consumed by the
//! kernel's BPF subsystem. Meant to run as a late pass over a compiler's
//! already-built debug info: the host mirrors each compile unit's DIE tree,
//! feeds the roots to a context, and gets one self-contained BTF blob
//! written into a named output section.
//!
//! The overall design is as follows: a [`BtfContext`] walks the DIE forest,
//! classifies every entry into a BTF kind (skipping what BTF cannot
//! express, e.g. floats), and assigns dense 1-based type ids in visit
//! order. Types are represented with a Rust and a C part; the former holds
//! per-kind construction state, the latter the exact wire layout. Because
//! type graphs contain forward and cyclic references, entries are built in
//! two phases: shape at registration, then name and reference resolution
//! once the id map is total. References to skipped types collapse to the
//! void id 0 rather than failing the translation.
//!
//! Example:
//!
//! ```
//! use dwarf2btf::{BtfContext, DieTree, SectionSink};
//! use gimli::{
//!     DW_AT_byte_size, DW_AT_encoding, DW_AT_name, DW_AT_type, DW_ATE_signed,
//!     DW_TAG_base_type, DW_TAG_compile_unit, DW_TAG_pointer_type,
//! };
//!
//! let mut tree = DieTree::new();
//! let cu = tree.add_die(DW_TAG_compile_unit);
//!
//! let int = tree.add_child(cu, DW_TAG_base_type);
//! tree.set_attr(int, DW_AT_name, "int");
//! tree.set_attr(int, DW_AT_byte_size, 4u64);
//! tree.set_attr(int, DW_AT_encoding, u64::from(DW_ATE_signed.0));
//!
//! let ptr = tree.add_child(cu, DW_TAG_pointer_type);
//! tree.set_attr(ptr, DW_AT_type, int);
//!
//! let mut ctx = BtfContext::new(&tree);
//! ctx.add_compile_unit(cu).unwrap();
//! ctx.finish().unwrap();
//!
//! let mut sink = SectionSink::new();
//! ctx.emit(&mut sink, ".BTF").unwrap();
//!
//! let bytes = sink.section(".BTF").unwrap();
//! assert_eq!(bytes[..2], [0x9f, 0xeb]); // BTF magic, little-endian
//! ```

pub mod context;
pub mod die;
pub mod sink;
pub mod strtab;

mod btf;
mod cbtf;
mod error;

pub use crate::context::BtfContext;
pub use crate::die::{AttrValue, Die, DieId, DieTree};
pub use crate::error::{Error, Result};
pub use crate::sink::{ByteSink, SectionSink};
pub use crate::strtab::BtfStringTable;
