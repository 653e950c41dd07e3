//! Translation context: walks compile-unit DIE trees, reduces them to a
//! dense vector of BTF type entries and emits the final section bytes.

use std::collections::HashMap;
use std::io::Write;
use std::mem;

use gimli::{DW_TAG_compile_unit, DW_TAG_subprogram};

use crate::btf::{self, Type};
use crate::cbtf;
use crate::die::{DieId, DieTree};
use crate::sink::ByteSink;
use crate::strtab::BtfStringTable;
use crate::{Error, Result};

/// Identity map from registered DIEs to their dense 1-based type ids.
/// Unregistered DIEs resolve to the void id 0, which is how references to
/// skipped types collapse.
pub(crate) struct TypeIds {
    map: HashMap<DieId, u32>,
}

impl TypeIds {
    pub(crate) fn new() -> TypeIds {
        TypeIds {
            map: HashMap::new(),
        }
    }

    pub(crate) fn get(&self, die: DieId) -> u32 {
        self.map.get(&die).copied().unwrap_or(0)
    }

    fn contains(&self, die: DieId) -> bool {
        self.map.contains_key(&die)
    }

    pub(crate) fn insert(&mut self, die: DieId, id: u32) {
        self.map.insert(die, id);
    }
}

/// Main representation of one DWARF-to-BTF translation. Borrows the DIE
/// tree for its whole lifetime and is driven in a strict sequence:
/// construct, any number of [`BtfContext::add_compile_unit`] calls, one
/// [`BtfContext::finish`], then any number of [`BtfContext::emit`] calls.
pub struct BtfContext<'d> {
    tree: &'d DieTree,
    header: cbtf::btf_header,
    entries: Vec<Type>,
    ids: TypeIds,
    strings: BtfStringTable,
    finished: bool,
}

impl<'d> BtfContext<'d> {
    pub fn new(tree: &'d DieTree) -> BtfContext<'d> {
        Self::with_strings(tree, BtfStringTable::new())
    }

    /// A context whose string table deduplicates by content. The output
    /// stays valid BTF, only smaller; use [`BtfContext::new`] for output
    /// byte-identical with compilers that append unconditionally.
    pub fn with_dedup_strings(tree: &'d DieTree) -> BtfContext<'d> {
        Self::with_strings(tree, BtfStringTable::with_dedup())
    }

    fn with_strings(tree: &'d DieTree, strings: BtfStringTable) -> BtfContext<'d> {
        BtfContext {
            tree,
            header: cbtf::btf_header::default(),
            entries: Vec::new(),
            ids: TypeIds::new(),
            strings,
            finished: false,
        }
    }

    /// Register every representable type reachable from one compile-unit
    /// root. Ids are assigned in DIE child-list order.
    pub fn add_compile_unit(&mut self, unit: DieId) -> Result<()> {
        assert_eq!(
            self.tree.die(unit).tag(),
            DW_TAG_compile_unit,
            "root DIE is not a compile unit"
        );
        assert!(!self.finished, "compile unit added after finish");

        self.register(unit)
    }

    // Recursive registration walk. Containers (compile units, subprograms)
    // are descended into; type DIEs are registered without recursing, as
    // their children become trailing records of the entry and everything
    // else is reachable through DIE references.
    fn register(&mut self, id: DieId) -> Result<()> {
        let tree = self.tree;
        let die = tree.die(id);

        if die.tag() == DW_TAG_compile_unit || die.tag() == DW_TAG_subprogram {
            for child in die.children() {
                self.register(*child)?;
            }
        }

        if btf::should_skip_die(tree, id) || self.ids.contains(id) {
            return Ok(());
        }

        if let Some(entry) = Type::from_die(tree, id)? {
            if self.entries.len() >= cbtf::BTF_MAX_TYPE as usize {
                return Err(Error::TooManyTypes(self.entries.len() + 1));
            }
            self.entries.push(entry);
            self.ids.insert(id, self.entries.len() as u32);
        }
        Ok(())
    }

    /// Run the completion pass over every registered entry and build the
    /// header. No compile unit may be added afterwards.
    pub fn finish(&mut self) -> Result<()> {
        assert!(!self.finished, "finish called twice");
        self.finished = true;

        self.complete_data()?;
        self.build_header();
        Ok(())
    }

    fn complete_data(&mut self) -> Result<()> {
        // Burn offset 0 so it denotes the anonymous name.
        self.strings.add("")?;

        let tree = self.tree;
        let BtfContext {
            entries,
            ids,
            strings,
            ..
        } = self;

        for entry in entries.iter_mut() {
            entry.complete(tree, ids, strings)?;
        }
        Ok(())
    }

    fn build_header(&mut self) {
        let type_len: usize = self.entries.iter().map(|entry| entry.encoded_size()).sum();

        self.header = cbtf::btf_header {
            magic: cbtf::BTF_MAGIC,
            version: cbtf::BTF_VERSION,
            flags: 0,
            hdr_len: mem::size_of::<cbtf::btf_header>() as u32,
            type_off: 0,
            type_len: type_len as u32,
            str_off: type_len as u32,
            str_len: self.strings.size() as u32,
        };
    }

    /// Stream the whole blob (header, type section, string section) into a
    /// named section of the sink. May be called repeatedly; the bytes are
    /// identical each time.
    pub fn emit<S: ByteSink>(&self, sink: &mut S, section: &str) -> Result<()> {
        assert!(self.finished, "emit before finish");

        sink.switch_section(section)?;

        self.header.to_writer(sink)?;
        for entry in &self.entries {
            entry.emit(sink)?;
        }
        self.strings.emit(sink)?;
        Ok(())
    }

    /// Dump every type entry and the string table in a human-readable,
    /// unstable format.
    pub fn show_all<W: Write>(&self, w: &mut W) -> Result<()> {
        for entry in &self.entries {
            entry.print(w, self)?;
            writeln!(w)?;
        }
        self.strings.show(w)
    }

    /// Number of registered type entries; emitted ids run from 1 to this.
    pub fn num_types(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn string_at(&self, offset: u32) -> Result<&str> {
        self.strings.get(offset)
    }

    pub(crate) fn type_name_by_id(&self, id: u32) -> String {
        if id == 0 {
            return "void".to_string();
        }
        match self.entries.get((id - 1) as usize) {
            Some(entry) => self.type_name(entry),
            None => String::new(),
        }
    }

    // Diagnostic name of an entry, following reference chains.
    pub(crate) fn type_name(&self, entry: &Type) -> String {
        let named = |off| self.strings.get(off).unwrap_or_default().to_string();

        match entry.kind() {
            cbtf::BTF_KIND_INT
            | cbtf::BTF_KIND_STRUCT
            | cbtf::BTF_KIND_UNION
            | cbtf::BTF_KIND_ARRAY
            | cbtf::BTF_KIND_FUNC
            | cbtf::BTF_KIND_FUNC_PROTO => named(entry.name_off()),
            cbtf::BTF_KIND_ENUM => format!("enum {}", named(entry.name_off())),
            cbtf::BTF_KIND_FWD => format!("fwd {}", named(entry.name_off())),
            cbtf::BTF_KIND_CONST => {
                format!("const {}", self.type_name_by_id(entry.type_index()))
            }
            cbtf::BTF_KIND_PTR => format!("ptr {}", self.type_name_by_id(entry.type_index())),
            cbtf::BTF_KIND_VOLATILE => {
                format!("volatile {}", self.type_name_by_id(entry.type_index()))
            }
            cbtf::BTF_KIND_TYPEDEF => {
                format!("typedef {}", self.type_name_by_id(entry.type_index()))
            }
            cbtf::BTF_KIND_RESTRICT => {
                format!("restrict {}", self.type_name_by_id(entry.type_index()))
            }
            _ => String::new(),
        }
    }
}
