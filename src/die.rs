//! In-memory DWARF debugging information entries (DIEs).
//!
//! The host mirrors its per-compile-unit DIE forest into a [`DieTree`]
//! before translation: every node carries a DWARF tag, an ordered attribute
//! list and an ordered child list. Nodes are addressed by copyable
//! [`DieId`] handles, so reference cycles (a struct containing a pointer
//! back to itself) need no back-pointers. The tree is only ever read by the
//! translator and must outlive it.
//!
//! Tags and attribute ids are the `gimli` constants (`DW_TAG_*`,
//! `DW_AT_*`); attribute values are reduced to the three shapes the
//! translator consumes: integers, strings and DIE references.

use gimli::{DwAt, DwTag};

use crate::{Error, Result};

/// Handle of a [`Die`] inside a [`DieTree`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct DieId(usize);

/// A single attribute value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttrValue {
    Int(u64),
    Str(String),
    Ref(DieId),
}

impl From<u64> for AttrValue {
    fn from(val: u64) -> Self {
        AttrValue::Int(val)
    }
}

impl From<&str> for AttrValue {
    fn from(val: &str) -> Self {
        AttrValue::Str(val.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(val: String) -> Self {
        AttrValue::Str(val)
    }
}

impl From<DieId> for AttrValue {
    fn from(val: DieId) -> Self {
        AttrValue::Ref(val)
    }
}

/// One debugging information entry.
#[derive(Clone, Debug)]
pub struct Die {
    tag: DwTag,
    attrs: Vec<(DwAt, AttrValue)>,
    children: Vec<DieId>,
}

impl Die {
    pub fn tag(&self) -> DwTag {
        self.tag
    }

    pub fn children(&self) -> &[DieId] {
        &self.children
    }

    /// Look an attribute up by id.
    pub fn attr(&self, at: DwAt) -> Option<&AttrValue> {
        self.attrs.iter().find(|(a, _)| *a == at).map(|(_, v)| v)
    }

    pub fn attr_int(&self, at: DwAt) -> Option<u64> {
        match self.attr(at) {
            Some(AttrValue::Int(val)) => Some(*val),
            _ => None,
        }
    }

    pub fn attr_str(&self, at: DwAt) -> Option<&str> {
        match self.attr(at) {
            Some(AttrValue::Str(val)) => Some(val.as_str()),
            _ => None,
        }
    }

    pub fn attr_ref(&self, at: DwAt) -> Option<DieId> {
        match self.attr(at) {
            Some(AttrValue::Ref(val)) => Some(*val),
            _ => None,
        }
    }

    /// Like `attr_int` but an error when absent, for attributes the host
    /// contract makes mandatory on this tag.
    pub fn require_int(&self, at: DwAt) -> Result<u64> {
        self.attr_int(at).ok_or(Error::MissingAttribute {
            tag: self.tag,
            attr: at,
        })
    }

    pub fn require_str(&self, at: DwAt) -> Result<&str> {
        self.attr_str(at).ok_or(Error::MissingAttribute {
            tag: self.tag,
            attr: at,
        })
    }

    pub fn require_ref(&self, at: DwAt) -> Result<DieId> {
        self.attr_ref(at).ok_or(Error::MissingAttribute {
            tag: self.tag,
            attr: at,
        })
    }
}

/// Arena owning every DIE of a translation.
#[derive(Debug, Default)]
pub struct DieTree {
    dies: Vec<Die>,
}

impl DieTree {
    pub fn new() -> DieTree {
        DieTree::default()
    }

    /// Add a free-standing DIE (e.g. a compile-unit root).
    pub fn add_die(&mut self, tag: DwTag) -> DieId {
        let id = DieId(self.dies.len());
        self.dies.push(Die {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        });
        id
    }

    /// Add a DIE as the last child of `parent`.
    pub fn add_child(&mut self, parent: DieId, tag: DwTag) -> DieId {
        let id = self.add_die(tag);
        self.dies[parent.0].children.push(id);
        id
    }

    /// Set (or overwrite) an attribute on a DIE.
    pub fn set_attr<V: Into<AttrValue>>(&mut self, die: DieId, at: DwAt, value: V) {
        let attrs = &mut self.dies[die.0].attrs;
        let value = value.into();
        match attrs.iter_mut().find(|(a, _)| *a == at) {
            Some((_, old)) => *old = value,
            None => attrs.push((at, value)),
        }
    }

    pub fn die(&self, id: DieId) -> &Die {
        &self.dies[id.0]
    }
}
