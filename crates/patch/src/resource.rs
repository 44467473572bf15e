//! Allocation of ids for resources introduced by a patch.
//!
//! apktool keeps the id of every resource in `res/values/public.xml`
//! (`<public type="id" name="foo" id="0x7f0a0001" />`) and the generated
//! constants in `R$<type>.smali`. A new resource gets one past the largest id
//! already used by its type, so each type needs at least one existing entry to
//! anchor the numbering.

use crate::Instruction;
use crate::instruction::WorkTree;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use smalipatch_utils::errors::InstructionError;
use tracing::{debug, info};

/// Path of the public resource table inside a decoded app.
pub const PUBLIC_XML: &str = "res/values/public.xml";

/// A `<public>` entry of the resource table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicEntry {
    pub kind: String,
    pub name: String,
    pub id: String,
}

/// Defines `name` as a new resource of `resource_type`.
#[derive(Debug, Clone)]
pub struct DefineResource {
    /// Directory holding the `R$<type>.smali` files, e.g. `smali/com/example/app`.
    pub r_path: String,
    pub resource_type: String,
    pub name: String,
}

pub fn define_resource(
    r_path: impl Into<String>,
    resource_type: impl Into<String>,
    name: impl Into<String>,
) -> Box<dyn Instruction> {
    Box::new(DefineResource {
        r_path: r_path.into(),
        resource_type: resource_type.into(),
        name: name.into(),
    })
}

impl DefineResource {
    /// Path of the constant holder for this resource's type.
    pub fn r_file(&self) -> String {
        format!(
            "{}/R${}.smali",
            self.r_path.trim_end_matches('/'),
            self.resource_type
        )
    }

    /// Adds the entry to `table`, returning the new table and the allocated id,
    /// or `None` if the resource is already defined.
    pub fn allocate(&self, table: &str) -> Result<Option<(String, String)>, InstructionError> {
        let entries = parse_public_table(table)?;
        let mut last = None;
        for entry in entries.iter().filter(|e| e.kind == self.resource_type) {
            if entry.name == self.name {
                debug!(
                    "{}/{} already defined as {}",
                    self.resource_type, self.name, entry.id
                );
                return Ok(None);
            }
            let id = parse_resource_id(&entry.id).ok_or_else(|| {
                InstructionError::ResourceTable(format!("invalid id {:?} for {}", entry.id, entry.name))
            })?;
            last = last.max(Some(id));
        }

        let last =
            last.ok_or_else(|| InstructionError::ResourceTypeSeedMissing(self.resource_type.clone()))?;
        let next = last.checked_add(1).ok_or_else(|| {
            InstructionError::ResourceTable(format!("id space of {} exhausted", self.resource_type))
        })?;
        let id = format!("{next:#x}");

        let close = table
            .rfind("\n</resources>")
            .ok_or_else(|| InstructionError::ResourceTable("missing </resources>".to_string()))?;
        let mut out = String::with_capacity(table.len() + 64);
        out.push_str(&table[..close]);
        out.push_str(&format!(
            "\n    <public type=\"{}\" name=\"{}\" id=\"{}\" />",
            self.resource_type, self.name, id
        ));
        out.push_str(&table[close..]);
        Ok(Some((out, id)))
    }
}

impl Instruction for DefineResource {
    fn name(&self) -> &'static str {
        "define_resource"
    }

    fn apply(&self, tree: &mut WorkTree<'_>) -> Result<(), InstructionError> {
        let mut allocated = None;
        tree.edit_text(PUBLIC_XML, |table| match self.allocate(table)? {
            Some((out, id)) => {
                allocated = Some(id);
                Ok(out)
            }
            None => Ok(table.to_string()),
        })?;

        let Some(id) = allocated else {
            return Ok(());
        };
        info!("allocated {}/{} = {id}", self.resource_type, self.name);
        tree.edit_text(&self.r_file(), |smali| {
            Ok(format!(
                "{smali}\n\n.field public static final {}:I = {id}\n",
                self.name
            ))
        })
    }
}

/// Parses the `<public>` entries of a resource table.
pub fn parse_public_table(xml: &str) -> Result<Vec<PublicEntry>, InstructionError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    loop {
        match reader.read_event().map_err(table_error)? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"public" => {
                entries.push(public_entry(&e)?);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(entries)
}

fn public_entry(start: &BytesStart<'_>) -> Result<PublicEntry, InstructionError> {
    let mut entry = PublicEntry::default();
    for attr in start.attributes() {
        let attr = attr.map_err(table_error)?;
        let value = attr.unescape_value().map_err(table_error)?.into_owned();
        match attr.key.as_ref() {
            b"type" => entry.kind = value,
            b"name" => entry.name = value,
            b"id" => entry.id = value,
            _ => {}
        }
    }
    Ok(entry)
}

fn table_error(err: impl std::fmt::Display) -> InstructionError {
    InstructionError::ResourceTable(err.to_string())
}

/// Parses an id literal, detecting the base from its prefix (`0x`, `0o`, `0b`,
/// or a leading `0` for octal).
pub fn parse_resource_id(s: &str) -> Option<u32> {
    let s = s.trim();
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (hex, 16)
    } else if let Some(oct) = s.strip_prefix("0o").or_else(|| s.strip_prefix("0O")) {
        (oct, 8)
    } else if let Some(bin) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        (bin, 2)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    u32::from_str_radix(digits, radix).ok()
}
