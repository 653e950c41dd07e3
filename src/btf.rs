//! Classification of DWARF entries into BTF kinds, and the per-kind type
//! entries built from them.
//!
//! Each entry is built in two phases. The shape phase runs at registration
//! and fills everything that does not depend on other entries (kind, vlen,
//! byte size, the integer encoding word). The completion phase runs once
//! every entry is registered, when the DIE-to-id map is total: it resolves
//! names into the string table and DIE references into dense type ids.
//! Splitting the two lets the reducer walk compile units in any order and
//! still encode forward and cyclic references as plain 32-bit ids.

use std::io::Write;
use std::mem;

use byteorder::{LittleEndian, WriteBytesExt};
use gimli::{
    DwAte, DW_AT_bit_offset, DW_AT_bit_size, DW_AT_byte_size, DW_AT_const_value, DW_AT_count,
    DW_AT_declaration, DW_AT_encoding, DW_AT_name, DW_AT_type, DW_ATE_boolean, DW_ATE_signed,
    DW_ATE_signed_char, DW_ATE_unsigned, DW_ATE_unsigned_char, DW_TAG_array_type,
    DW_TAG_base_type, DW_TAG_class_type, DW_TAG_compile_unit, DW_TAG_const_type,
    DW_TAG_enumeration_type, DW_TAG_enumerator, DW_TAG_formal_parameter,
    DW_TAG_inlined_subroutine, DW_TAG_lexical_block, DW_TAG_member, DW_TAG_pointer_type,
    DW_TAG_restrict_type, DW_TAG_structure_type, DW_TAG_subprogram, DW_TAG_subrange_type,
    DW_TAG_subroutine_type, DW_TAG_typedef, DW_TAG_union_type, DW_TAG_variable,
    DW_TAG_volatile_type,
};
use log::warn;

use crate::cbtf;
use crate::context::{BtfContext, TypeIds};
use crate::die::{Die, DieId, DieTree};
use crate::strtab::BtfStringTable;
use crate::{Error, Result};

/// The BTF kind a DIE maps to, `BTF_KIND_UNKN` for constructs BTF cannot
/// express (floats, bare variables, blocks...).
pub(crate) fn die_kind(tree: &DieTree, id: DieId) -> u32 {
    let die = tree.die(id);

    match die.tag() {
        DW_TAG_base_type => match base_type_encoding(die) {
            cbtf::BTF_INVALID_ENCODING => cbtf::BTF_KIND_UNKN,
            _ => cbtf::BTF_KIND_INT,
        },
        DW_TAG_const_type => cbtf::BTF_KIND_CONST,
        DW_TAG_pointer_type => cbtf::BTF_KIND_PTR,
        DW_TAG_restrict_type => cbtf::BTF_KIND_RESTRICT,
        DW_TAG_volatile_type => cbtf::BTF_KIND_VOLATILE,
        DW_TAG_structure_type | DW_TAG_class_type => match die.attr(DW_AT_declaration) {
            Some(_) => cbtf::BTF_KIND_FWD,
            None => cbtf::BTF_KIND_STRUCT,
        },
        DW_TAG_union_type => match die.attr(DW_AT_declaration) {
            Some(_) => cbtf::BTF_KIND_FWD,
            None => cbtf::BTF_KIND_UNION,
        },
        DW_TAG_enumeration_type => cbtf::BTF_KIND_ENUM,
        // A variable of array type stands for the array itself; any other
        // variable is not a type.
        DW_TAG_variable => match die.attr_ref(DW_AT_type) {
            Some(ty) if tree.die(ty).tag() == DW_TAG_array_type => cbtf::BTF_KIND_ARRAY,
            _ => cbtf::BTF_KIND_UNKN,
        },
        DW_TAG_array_type
        | DW_TAG_subprogram
        | DW_TAG_subroutine_type
        | DW_TAG_typedef
        | DW_TAG_compile_unit
        | DW_TAG_formal_parameter
        | DW_TAG_inlined_subroutine
        | DW_TAG_lexical_block => cbtf::BTF_KIND_UNKN,
        tag => {
            warn!("unsupported DWARF tag {tag}");
            cbtf::BTF_KIND_UNKN
        }
    }
}

/// Whether a DIE has no BTF representation and must be left out. Reference
/// kinds are skipped along with whatever they point at, so a `const float`
/// disappears together with the `float`.
pub(crate) fn should_skip_die(tree: &DieTree, id: DieId) -> bool {
    let die = tree.die(id);

    match die.tag() {
        DW_TAG_const_type | DW_TAG_pointer_type | DW_TAG_restrict_type | DW_TAG_typedef
        | DW_TAG_volatile_type => match die.attr_ref(DW_AT_type) {
            Some(pointee) => should_skip_die(tree, pointee),
            // Pointers with no pointee are void pointers; everything else
            // missing its referent is malformed.
            None => {
                if die.tag() != DW_TAG_pointer_type {
                    warn!("{} has no referenced type", die.tag());
                }
                true
            }
        },
        _ => die_kind(tree, id) == cbtf::BTF_KIND_UNKN,
    }
}

/// The BTF integer encoding of a base type, `BTF_INVALID_ENCODING` for
/// encodings BTF has no notion of (floats, decimals, fixed point...).
pub(crate) fn base_type_encoding(die: &Die) -> u32 {
    let Some(encoding) = die.attr_int(DW_AT_encoding) else {
        return cbtf::BTF_INVALID_ENCODING;
    };

    match DwAte(encoding as u8) {
        DW_ATE_boolean => cbtf::BTF_INT_BOOL,
        DW_ATE_signed => cbtf::BTF_INT_SIGNED,
        DW_ATE_signed_char | DW_ATE_unsigned_char => cbtf::BTF_INT_CHAR,
        DW_ATE_unsigned => 0,
        _ => cbtf::BTF_INVALID_ENCODING,
    }
}

/// A BTF type entry under construction, one arm per group of kinds sharing
/// a layout.
pub(crate) enum Type {
    Int(Int),
    Ref(Ref),
    Array(Array),
    Struct(Struct),
    Enum(Enum),
    Fwd(Fwd),
    Func(Func),
}

impl Type {
    /// Shape-phase construction for a supported DIE; `None` when the kind
    /// has no entry representation.
    pub(crate) fn from_die(tree: &DieTree, die: DieId) -> Result<Option<Type>> {
        Ok(match die_kind(tree, die) {
            cbtf::BTF_KIND_INT => Some(Type::Int(Int::from_die(tree, die)?)),
            kind @ (cbtf::BTF_KIND_PTR | cbtf::BTF_KIND_TYPEDEF | cbtf::BTF_KIND_VOLATILE
            | cbtf::BTF_KIND_CONST | cbtf::BTF_KIND_RESTRICT) => {
                Some(Type::Ref(Ref::from_die(die, kind)))
            }
            cbtf::BTF_KIND_ARRAY => Some(Type::Array(Array::from_die(tree, die)?)),
            kind @ (cbtf::BTF_KIND_STRUCT | cbtf::BTF_KIND_UNION) => {
                Some(Type::Struct(Struct::from_die(tree, die, kind)?))
            }
            cbtf::BTF_KIND_ENUM => Some(Type::Enum(Enum::from_die(tree, die)?)),
            cbtf::BTF_KIND_FWD => Some(Type::Fwd(Fwd::from_die(tree, die))),
            kind @ (cbtf::BTF_KIND_FUNC | cbtf::BTF_KIND_FUNC_PROTO) => {
                Some(Type::Func(Func::from_die(tree, die, kind)?))
            }
            _ => None,
        })
    }

    fn btf_type(&self) -> &cbtf::btf_type {
        match self {
            Type::Int(e) => &e.btf_type,
            Type::Ref(e) => &e.btf_type,
            Type::Array(e) => &e.btf_type,
            Type::Struct(e) => &e.btf_type,
            Type::Enum(e) => &e.btf_type,
            Type::Fwd(e) => &e.btf_type,
            Type::Func(e) => &e.btf_type,
        }
    }

    pub(crate) fn kind(&self) -> u32 {
        self.btf_type().kind()
    }

    pub(crate) fn name_off(&self) -> u32 {
        self.btf_type().name_off
    }

    /// The referred type id of a reference kind (void id 0 otherwise).
    pub(crate) fn type_index(&self) -> u32 {
        self.btf_type().size_type
    }

    /// Completion phase: resolve names and DIE references now that the id
    /// map is total.
    pub(crate) fn complete(
        &mut self,
        tree: &DieTree,
        ids: &TypeIds,
        strings: &mut BtfStringTable,
    ) -> Result<()> {
        match self {
            Type::Int(e) => e.complete(tree, strings),
            Type::Ref(e) => e.complete(tree, ids),
            Type::Array(e) => e.complete(tree, ids, strings),
            Type::Struct(e) => e.complete(tree, ids, strings),
            Type::Enum(e) => e.complete(tree, strings),
            Type::Fwd(e) => e.complete(tree, strings),
            Type::Func(e) => e.complete(tree, ids, strings),
        }
    }

    /// Exact number of bytes [`Type::emit`] writes for this entry.
    pub(crate) fn encoded_size(&self) -> usize {
        let common = mem::size_of::<cbtf::btf_type>();
        let vlen = self.btf_type().vlen() as usize;

        match self {
            Type::Int(_) => common + mem::size_of::<u32>(),
            Type::Ref(_) | Type::Fwd(_) => common,
            Type::Array(_) => common + mem::size_of::<cbtf::btf_array>(),
            Type::Struct(_) => common + vlen * mem::size_of::<cbtf::btf_member>(),
            Type::Enum(_) => common + vlen * mem::size_of::<cbtf::btf_enum>(),
            Type::Func(_) => common + vlen * mem::size_of::<u32>(),
        }
    }

    /// Write the 12-byte common record plus any kind-specific trailer.
    pub(crate) fn emit<W: Write>(&self, w: &mut W) -> Result<()> {
        self.btf_type().to_writer(w)?;

        match self {
            Type::Int(e) => w.write_u32::<LittleEndian>(e.int_val)?,
            Type::Ref(_) | Type::Fwd(_) => (),
            Type::Array(e) => e.btf_array.to_writer(w)?,
            Type::Struct(e) => {
                for member in &e.members {
                    member.to_writer(w)?;
                }
            }
            Type::Enum(e) => {
                for value in &e.values {
                    value.to_writer(w)?;
                }
            }
            Type::Func(e) => {
                for parameter in &e.parameters {
                    w.write_u32::<LittleEndian>(*parameter)?;
                }
            }
        }
        Ok(())
    }

    /// Human-readable dump of the entry. The format is diagnostic only.
    pub(crate) fn print<W: Write>(&self, w: &mut W, ctx: &BtfContext) -> Result<()> {
        let bt = self.btf_type();
        let (name_off, info, size_type) = (bt.name_off, bt.info, bt.size_type);

        writeln!(w, "kind {}", cbtf::kind_str(bt.kind()))?;
        writeln!(w, "\tname: {}", ctx.type_name(self))?;
        writeln!(w, "\tname_off: {name_off}")?;
        writeln!(w, "\tinfo: {info:#010x}")?;
        writeln!(w, "\tsize/type: {size_type:#010x}")?;

        match self {
            Type::Int(e) => {
                let desc = e.int_val;
                writeln!(w, "\tdesc: {desc:#010x}")?;
            }
            Type::Array(e) => {
                let (elem, index, nelems) =
                    (e.btf_array.r#type, e.btf_array.index_type, e.btf_array.nelems);
                writeln!(w, "\telement type: {elem:#010x}")?;
                writeln!(w, "\tindex type: {index:#010x}")?;
                writeln!(w, "\t# of elements: {nelems}")?;
            }
            Type::Struct(e) => {
                for member in &e.members {
                    let (name_off, ty) = (member.name_off, member.r#type);
                    writeln!(
                        w,
                        "\tmember: {} of type {} ({ty})",
                        ctx.string_at(name_off)?,
                        ctx.type_name_by_id(ty),
                    )?;
                }
            }
            Type::Enum(e) => {
                for value in &e.values {
                    let (name_off, val) = (value.name_off, value.val);
                    writeln!(w, "\tsymbol: {} of value {val}", ctx.string_at(name_off)?)?;
                }
            }
            Type::Func(e) => {
                for parameter in &e.parameters {
                    writeln!(w, "\tparameter of type {}", ctx.type_name_by_id(*parameter))?;
                }
            }
            Type::Ref(_) | Type::Fwd(_) => (),
        }
        Ok(())
    }
}

/// `BTF_KIND_INT`.
pub(crate) struct Int {
    die: DieId,
    btf_type: cbtf::btf_type,
    // Encoding, bit offset and bit size of the integer, packed per ABI.
    int_val: u32,
}

impl Int {
    fn from_die(tree: &DieTree, id: DieId) -> Result<Int> {
        let die = tree.die(id);

        let encoding = base_type_encoding(die);
        debug_assert_ne!(encoding, cbtf::BTF_INVALID_ENCODING);
        let mut int_val = (encoding & 0xf) << 24;

        if let Some(offset) = die.attr_int(DW_AT_bit_offset) {
            int_val |= ((offset as u32) & 0xff) << 16;
        }

        let size = die.require_int(DW_AT_byte_size)? as u32;

        match die.attr_int(DW_AT_bit_size) {
            Some(bits) => int_val |= (bits as u32) & 0xff,
            None => int_val |= (size << 3) & 0xff,
        }

        Ok(Int {
            die: id,
            btf_type: cbtf::btf_type {
                name_off: 0,
                info: cbtf::BTF_KIND_INT << 24,
                size_type: size,
            },
            int_val,
        })
    }

    fn complete(&mut self, tree: &DieTree, strings: &mut BtfStringTable) -> Result<()> {
        let name = tree.die(self.die).require_str(DW_AT_name)?;
        self.btf_type.name_off = strings.add(name)?;
        Ok(())
    }
}

/// The reference kinds sharing the bare 12-byte layout: `BTF_KIND_PTR`,
/// `BTF_KIND_CONST`, `BTF_KIND_VOLATILE`, `BTF_KIND_TYPEDEF` and
/// `BTF_KIND_RESTRICT`.
pub(crate) struct Ref {
    die: DieId,
    btf_type: cbtf::btf_type,
}

impl Ref {
    fn from_die(die: DieId, kind: u32) -> Ref {
        debug_assert!(matches!(
            kind,
            cbtf::BTF_KIND_PTR
                | cbtf::BTF_KIND_TYPEDEF
                | cbtf::BTF_KIND_VOLATILE
                | cbtf::BTF_KIND_CONST
                | cbtf::BTF_KIND_RESTRICT
        ));

        Ref {
            die,
            btf_type: cbtf::btf_type {
                name_off: 0,
                info: (kind & 0xf) << 24,
                size_type: 0,
            },
        }
    }

    fn complete(&mut self, tree: &DieTree, ids: &TypeIds) -> Result<()> {
        let referent = tree.die(self.die).require_ref(DW_AT_type)?;

        // Reference kinds don't have a name.
        self.btf_type.name_off = 0;
        self.btf_type.size_type = ids.get(referent);
        Ok(())
    }
}

/// `BTF_KIND_FWD`. The kind flag distinguishes forward-declared unions
/// from structs.
pub(crate) struct Fwd {
    die: DieId,
    btf_type: cbtf::btf_type,
}

impl Fwd {
    fn from_die(tree: &DieTree, id: DieId) -> Fwd {
        let mut info = cbtf::BTF_KIND_FWD << 24;
        if tree.die(id).tag() == DW_TAG_union_type {
            info |= 1 << 31;
        }

        Fwd {
            die: id,
            btf_type: cbtf::btf_type {
                name_off: 0,
                info,
                size_type: 0,
            },
        }
    }

    fn complete(&mut self, tree: &DieTree, strings: &mut BtfStringTable) -> Result<()> {
        self.btf_type.name_off = match tree.die(self.die).attr_str(DW_AT_name) {
            Some(name) => strings.add(name)?,
            None => 0,
        };
        Ok(())
    }
}

/// `BTF_KIND_ENUM`.
pub(crate) struct Enum {
    die: DieId,
    btf_type: cbtf::btf_type,
    values: Vec<cbtf::btf_enum>,
}

impl Enum {
    fn from_die(tree: &DieTree, id: DieId) -> Result<Enum> {
        let die = tree.die(id);

        let size = die.require_int(DW_AT_byte_size)? as u32;
        let vlen = count_children(tree, die, DW_TAG_enumerator)?;

        Ok(Enum {
            die: id,
            btf_type: cbtf::btf_type {
                name_off: 0,
                info: (cbtf::BTF_KIND_ENUM << 24) | vlen,
                size_type: size,
            },
            values: Vec::new(),
        })
    }

    fn complete(&mut self, tree: &DieTree, strings: &mut BtfStringTable) -> Result<()> {
        let die = tree.die(self.die);

        self.btf_type.name_off = match die.attr_str(DW_AT_name) {
            Some(name) => strings.add(name)?,
            None => 0,
        };

        for child in die.children() {
            let child = tree.die(*child);
            if child.tag() != DW_TAG_enumerator {
                continue;
            }

            self.values.push(cbtf::btf_enum {
                name_off: strings.add(child.require_str(DW_AT_name)?)?,
                val: child.require_int(DW_AT_const_value)? as i32,
            });
        }
        Ok(())
    }
}

/// `BTF_KIND_ARRAY`, anchored at a `DW_TAG_variable` of array type: the
/// variable names the array, its referenced array-type DIE carries the
/// element type and the subrange child.
pub(crate) struct Array {
    die: DieId,
    array_type: DieId,
    btf_type: cbtf::btf_type,
    btf_array: cbtf::btf_array,
}

impl Array {
    fn from_die(tree: &DieTree, id: DieId) -> Result<Array> {
        let array_type = tree.die(id).require_ref(DW_AT_type)?;

        Ok(Array {
            die: id,
            array_type,
            btf_type: cbtf::btf_type {
                name_off: 0,
                info: cbtf::BTF_KIND_ARRAY << 24,
                size_type: 0,
            },
            btf_array: cbtf::btf_array {
                r#type: 0,
                index_type: 0,
                nelems: 0,
            },
        })
    }

    fn complete(
        &mut self,
        tree: &DieTree,
        ids: &TypeIds,
        strings: &mut BtfStringTable,
    ) -> Result<()> {
        let name = tree.die(self.die).require_str(DW_AT_name)?;
        self.btf_type.name_off = strings.add(name)?;

        let array_die = tree.die(self.array_type);
        self.btf_array.r#type = ids.get(array_die.require_ref(DW_AT_type)?);

        for child in array_die.children() {
            let child = tree.die(*child);
            if child.tag() == DW_TAG_subrange_type {
                self.btf_array.nelems = child.require_int(DW_AT_count)? as u32;
                self.btf_array.index_type = ids.get(child.require_ref(DW_AT_type)?);
                break;
            }
        }
        Ok(())
    }
}

/// `BTF_KIND_STRUCT` and `BTF_KIND_UNION`.
pub(crate) struct Struct {
    die: DieId,
    btf_type: cbtf::btf_type,
    members: Vec<cbtf::btf_member>,
}

impl Struct {
    fn from_die(tree: &DieTree, id: DieId, kind: u32) -> Result<Struct> {
        debug_assert!(matches!(kind, cbtf::BTF_KIND_STRUCT | cbtf::BTF_KIND_UNION));
        let die = tree.die(id);

        let size = die.require_int(DW_AT_byte_size)? as u32;
        let vlen = count_children(tree, die, DW_TAG_member)?;

        Ok(Struct {
            die: id,
            btf_type: cbtf::btf_type {
                name_off: 0,
                info: ((kind & 0xf) << 24) | vlen,
                size_type: size,
            },
            members: Vec::new(),
        })
    }

    fn complete(
        &mut self,
        tree: &DieTree,
        ids: &TypeIds,
        strings: &mut BtfStringTable,
    ) -> Result<()> {
        let die = tree.die(self.die);

        self.btf_type.name_off = match die.attr_str(DW_AT_name) {
            Some(name) => strings.add(name)?,
            None => 0,
        };

        for child in die.children() {
            let child = tree.die(*child);
            if child.tag() != DW_TAG_member {
                continue;
            }

            let name_off = match child.attr_str(DW_AT_name) {
                Some(name) => strings.add(name)?,
                None => 0,
            };

            self.members.push(cbtf::btf_member {
                name_off,
                r#type: ids.get(child.require_ref(DW_AT_type)?),
                offset: child.attr_int(DW_AT_bit_offset).unwrap_or(0) as u32,
            });
        }
        Ok(())
    }
}

/// `BTF_KIND_FUNC` and `BTF_KIND_FUNC_PROTO`. Parameters are encoded as a
/// bare type-id array.
pub(crate) struct Func {
    die: DieId,
    btf_type: cbtf::btf_type,
    parameters: Vec<u32>,
}

impl Func {
    pub(crate) fn from_die(tree: &DieTree, id: DieId, kind: u32) -> Result<Func> {
        debug_assert!(matches!(
            kind,
            cbtf::BTF_KIND_FUNC | cbtf::BTF_KIND_FUNC_PROTO
        ));
        let die = tree.die(id);

        let vlen = count_children(tree, die, DW_TAG_formal_parameter)?;

        Ok(Func {
            die: id,
            btf_type: cbtf::btf_type {
                name_off: 0,
                info: ((kind & 0xf) << 24) | vlen,
                size_type: 0,
            },
            parameters: Vec::new(),
        })
    }

    pub(crate) fn complete(
        &mut self,
        tree: &DieTree,
        ids: &TypeIds,
        strings: &mut BtfStringTable,
    ) -> Result<()> {
        let die = tree.die(self.die);

        // Subprogram name, else the name of the referenced return type,
        // else anonymous.
        let name = die.attr_str(DW_AT_name).or_else(|| {
            die.attr_ref(DW_AT_type)
                .and_then(|ret| tree.die(ret).attr_str(DW_AT_name))
        });
        self.btf_type.name_off = match name {
            Some(name) => strings.add(name)?,
            None => 0,
        };

        for child in die.children() {
            let child = tree.die(*child);
            if child.tag() != DW_TAG_formal_parameter {
                continue;
            }
            self.parameters.push(ids.get(child.require_ref(DW_AT_type)?));
        }
        Ok(())
    }
}

/// Count children with a given tag, rejecting counts vlen cannot hold.
fn count_children(tree: &DieTree, die: &Die, tag: gimli::DwTag) -> Result<u32> {
    let count = die
        .children()
        .iter()
        .filter(|child| tree.die(**child).tag() == tag)
        .count();

    if count > cbtf::BTF_MAX_VLEN as usize {
        return Err(Error::VlenOverflow(count));
    }
    Ok(count as u32)
}

#[cfg(test)]
mod tests {
    use gimli::DW_ATE_float;

    use super::*;

    fn signed_int(tree: &mut DieTree, parent: DieId, name: &str) -> DieId {
        let die = tree.add_child(parent, DW_TAG_base_type);
        tree.set_attr(die, DW_AT_name, name);
        tree.set_attr(die, DW_AT_byte_size, 4u64);
        tree.set_attr(die, DW_AT_encoding, u64::from(DW_ATE_signed.0));
        die
    }

    #[test]
    fn classify_base_types() {
        let mut tree = DieTree::new();
        let cu = tree.add_die(DW_TAG_compile_unit);

        let int = signed_int(&mut tree, cu, "int");
        assert_eq!(die_kind(&tree, int), cbtf::BTF_KIND_INT);

        let float = tree.add_child(cu, DW_TAG_base_type);
        tree.set_attr(float, DW_AT_byte_size, 4u64);
        tree.set_attr(float, DW_AT_encoding, u64::from(DW_ATE_float.0));
        assert_eq!(die_kind(&tree, float), cbtf::BTF_KIND_UNKN);
        assert!(should_skip_die(&tree, float));
    }

    #[test]
    fn skip_follows_reference_chains() {
        let mut tree = DieTree::new();
        let cu = tree.add_die(DW_TAG_compile_unit);

        let float = tree.add_child(cu, DW_TAG_base_type);
        tree.set_attr(float, DW_AT_encoding, u64::from(DW_ATE_float.0));
        let volatile = tree.add_child(cu, DW_TAG_volatile_type);
        tree.set_attr(volatile, DW_AT_type, float);
        let r#const = tree.add_child(cu, DW_TAG_const_type);
        tree.set_attr(r#const, DW_AT_type, volatile);

        assert!(should_skip_die(&tree, r#const));

        let int = signed_int(&mut tree, cu, "int");
        let good = tree.add_child(cu, DW_TAG_const_type);
        tree.set_attr(good, DW_AT_type, int);
        assert!(!should_skip_die(&tree, good));

        // A pointer without a pointee is a void pointer.
        let void_ptr = tree.add_child(cu, DW_TAG_pointer_type);
        assert!(should_skip_die(&tree, void_ptr));
    }

    #[test]
    fn fwd_union_sets_kind_flag() {
        let mut tree = DieTree::new();
        let cu = tree.add_die(DW_TAG_compile_unit);

        let s = tree.add_child(cu, DW_TAG_structure_type);
        tree.set_attr(s, DW_AT_declaration, 1u64);
        tree.set_attr(s, DW_AT_name, "s");
        let u = tree.add_child(cu, DW_TAG_union_type);
        tree.set_attr(u, DW_AT_declaration, 1u64);
        tree.set_attr(u, DW_AT_name, "u");

        assert_eq!(die_kind(&tree, s), cbtf::BTF_KIND_FWD);
        assert_eq!(die_kind(&tree, u), cbtf::BTF_KIND_FWD);

        let s_info = Fwd::from_die(&tree, s).btf_type.info;
        let u_info = Fwd::from_die(&tree, u).btf_type.info;
        assert_eq!(s_info, cbtf::BTF_KIND_FWD << 24);
        assert_eq!(u_info, (cbtf::BTF_KIND_FWD << 24) | (1 << 31));
    }

    #[test]
    fn func_encodes_parameters() {
        let mut tree = DieTree::new();
        let cu = tree.add_die(DW_TAG_compile_unit);

        let int = signed_int(&mut tree, cu, "int");
        let func = tree.add_child(cu, DW_TAG_subprogram);
        tree.set_attr(func, DW_AT_name, "add");
        for name in ["a", "b"] {
            let param = tree.add_child(func, DW_TAG_formal_parameter);
            tree.set_attr(param, DW_AT_name, name);
            tree.set_attr(param, DW_AT_type, int);
        }

        let mut ids = TypeIds::new();
        ids.insert(int, 1);
        let mut strings = BtfStringTable::new();
        strings.add("").unwrap();

        let mut entry = Func::from_die(&tree, func, cbtf::BTF_KIND_FUNC).unwrap();
        entry.complete(&tree, &ids, &mut strings).unwrap();

        let (info, name_off) = (entry.btf_type.info, entry.btf_type.name_off);
        assert_eq!(info, (cbtf::BTF_KIND_FUNC << 24) | 2);
        assert_eq!(name_off, 1);
        assert_eq!(entry.parameters, vec![1, 1]);

        let entry = Type::Func(entry);
        let mut bytes = Vec::new();
        entry.emit(&mut bytes).unwrap();
        assert_eq!(bytes.len(), entry.encoded_size());
        assert_eq!(bytes.len(), 12 + 2 * 4);
    }

    #[test]
    fn func_name_falls_back_to_return_type() {
        let mut tree = DieTree::new();
        let cu = tree.add_die(DW_TAG_compile_unit);

        let int = signed_int(&mut tree, cu, "int");
        let proto = tree.add_child(cu, DW_TAG_subroutine_type);
        tree.set_attr(proto, DW_AT_type, int);

        let mut strings = BtfStringTable::new();
        strings.add("").unwrap();

        let mut entry = Func::from_die(&tree, proto, cbtf::BTF_KIND_FUNC_PROTO).unwrap();
        entry.complete(&tree, &TypeIds::new(), &mut strings).unwrap();

        assert_eq!(strings.get(entry.btf_type.name_off).unwrap(), "int");
    }

    #[test]
    fn vlen_cannot_exceed_wire_limit() {
        let mut tree = DieTree::new();
        let cu = tree.add_die(DW_TAG_compile_unit);

        let huge = tree.add_child(cu, DW_TAG_enumeration_type);
        tree.set_attr(huge, DW_AT_byte_size, 4u64);
        for val in 0..=u64::from(cbtf::BTF_MAX_VLEN) {
            let child = tree.add_child(huge, DW_TAG_enumerator);
            tree.set_attr(child, DW_AT_const_value, val);
        }

        assert!(matches!(
            Enum::from_die(&tree, huge),
            Err(Error::VlenOverflow(_))
        ));
    }
}
