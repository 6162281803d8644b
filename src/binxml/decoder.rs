//! The recursive-descent binary-XML decoder.
//!
//! Grounded on the teacher crate's `binxml/deserializer.rs` (opcode
//! dispatch loop) and `binxml/tokens.rs` (`read_template`,
//! `read_open_start_element`, `read_attribute`, `read_substitution`): this
//! module walks the same token shapes, but writes directly into an owned
//! [`crate::model::tree::Tree`] instead of building an intermediate
//! `Vec<BinXMLDeserializedTokens>`, since nothing downstream of this crate
//! needs the token stream itself, only the materialised tree (§4.2).

use crate::binxml::name::NameCache;
use crate::binxml::opcode::{Opcode, TokenFlags};
use crate::binxml::template_cache::{TemplateCache, TemplateDefinition};
use crate::binxml::tokens::TemplateValueDescriptor;
use crate::binxml::value::{self, Value, ValueType};
use crate::err::{DecodeErrorKind, EvtxError};
use crate::model::tree::{Attribute, Node, NodeId, Tree};
use crate::utils::byte_cursor::ByteCursor;
use crate::utils::guid::Guid;
use crate::DecodeConfig;

/// Decode a binary-XML fragment starting at `start` in `buf`, stopping at
/// or before `end`, into a fresh [`Tree`].
pub(crate) fn decode_fragment(
    buf: &[u8],
    start: usize,
    end: usize,
    config: DecodeConfig,
) -> crate::err::Result<Tree> {
    let mut decoder = Decoder {
        buf,
        config,
        names: NameCache::new(),
        templates: TemplateCache::new(),
    };
    let mut tree = Tree::new();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut cursor = ByteCursor::with_pos(buf, start)?;
    decoder.run(&mut cursor, end, &mut tree, &mut stack, None, 0)?;
    Ok(tree)
}

struct Decoder<'a> {
    buf: &'a [u8],
    config: DecodeConfig,
    names: NameCache,
    templates: TemplateCache,
}

impl<'a> Decoder<'a> {
    /// Run the token-stream loop over `cursor` until `EndOfStream`, `end`,
    /// or the active substitution array is exhausted. Nodes are appended
    /// under `stack`'s top (or become the tree root if `stack` is empty).
    fn run(
        &mut self,
        cursor: &mut ByteCursor<'_>,
        end: usize,
        tree: &mut Tree,
        stack: &mut Vec<NodeId>,
        substitutions: Option<&[Value]>,
        depth: usize,
    ) -> crate::err::Result<()> {
        let mut pending_pi_target: Option<String> = None;

        while cursor.pos() < end {
            let byte = cursor.u8()?;
            let (opcode, flags) = Opcode::decode(byte)
                .ok_or_else(|| EvtxError::decode(DecodeErrorKind::UnknownOpcode(byte), cursor.pos() as u64 - 1))?;

            match opcode {
                Opcode::FragmentHeader => {
                    let _major = cursor.u8()?;
                    let _minor = cursor.u8()?;
                    let _flags = cursor.u8()?;
                }
                Opcode::EndOfStream => return Ok(()),
                Opcode::OpenStartElement => {
                    let _reserved = cursor.u16()?;
                    let _data_size = cursor.u32()?;
                    let name = crate::binxml::name::read_name_ref(cursor, &mut self.names)?;

                    if flags.contains(TokenFlags::HAS_MORE) {
                        let _attribute_list_data_size = cursor.u32()?;
                    }

                    let id = tree.push(Node::Element {
                        name,
                        attributes: Vec::new(),
                        children: Vec::new(),
                    });
                    match stack.last() {
                        Some(&parent) => tree.add_child(parent, id),
                        None => tree.set_root(id),
                    }
                    stack.push(id);
                }
                Opcode::Attribute => {
                    let name = crate::binxml::name::read_name_ref(cursor, &mut self.names)?;
                    let value = self.read_value_token(cursor, substitutions, depth)?;
                    let rendered = value.render();
                    let parent = *stack.last().ok_or_else(|| {
                        EvtxError::decode(DecodeErrorKind::BadNameRef, cursor.pos() as u64)
                    })?;
                    if let Node::Element { attributes, .. } = tree.node_mut(parent) {
                        attributes.push(Attribute { name, value: rendered });
                    }
                }
                Opcode::CloseStartElement => {}
                Opcode::CloseEmptyElement | Opcode::EndElement => {
                    stack.pop();
                }
                Opcode::Value => {
                    let value = self.read_inline_value(cursor, depth)?;
                    self.push_value_as_child(tree, stack, value);
                }
                Opcode::CDataSection => {
                    let text = cursor.len_prefixed_utf16_string(false)?;
                    let node = tree.push(Node::CData(text));
                    if let Some(&parent) = stack.last() {
                        tree.add_child(parent, node);
                    } else {
                        tree.set_root(node);
                    }
                }
                Opcode::CharRef => {
                    let code = cursor.u16()?;
                    let node = tree.push(Node::CharRef(code));
                    if let Some(&parent) = stack.last() {
                        tree.add_child(parent, node);
                    }
                }
                Opcode::EntityRef => {
                    let name = crate::binxml::name::read_name_ref(cursor, &mut self.names)?;
                    let node = tree.push(Node::EntityRef(name));
                    if let Some(&parent) = stack.last() {
                        tree.add_child(parent, node);
                    }
                }
                Opcode::PITarget => {
                    let name = crate::binxml::name::read_name_ref(cursor, &mut self.names)?;
                    pending_pi_target = Some(name);
                }
                Opcode::PIData => {
                    let data = cursor.len_prefixed_utf16_string(false)?;
                    let target = pending_pi_target.take().unwrap_or_default();
                    let node = tree.push(Node::ProcessingInstruction { target, data });
                    if let Some(&parent) = stack.last() {
                        tree.add_child(parent, node);
                    } else {
                        tree.set_root(node);
                    }
                }
                Opcode::TemplateInstance => {
                    self.decode_template_instance(cursor, tree, stack, depth)?;
                }
                Opcode::NormalSubstitution | Opcode::OptionalSubstitution => {
                    let optional = opcode == Opcode::OptionalSubstitution;
                    let value = self.resolve_substitution(cursor, substitutions, optional)?;
                    if let Some(value) = value {
                        self.push_value_as_child(tree, stack, value);
                    }
                }
            }

            if stack.is_empty() && substitutions.is_some() {
                // A template body's root element has closed; the body is done.
                return Ok(());
            }
        }

        Ok(())
    }

    fn push_value_as_child(&self, tree: &mut Tree, stack: &mut Vec<NodeId>, value: Value) {
        let node = tree.push(Node::Text(value.render()));
        match stack.last() {
            Some(&parent) => tree.add_child(parent, node),
            None => tree.set_root(node),
        }
    }

    /// Read the token immediately following an `Attribute` token: a `Value`
    /// or a substitution, per §4.2.
    fn read_value_token(
        &mut self,
        cursor: &mut ByteCursor<'_>,
        substitutions: Option<&[Value]>,
        depth: usize,
    ) -> crate::err::Result<Value> {
        let byte = cursor.u8()?;
        let (opcode, _flags) = Opcode::decode(byte)
            .ok_or_else(|| EvtxError::decode(DecodeErrorKind::UnknownOpcode(byte), cursor.pos() as u64 - 1))?;
        match opcode {
            Opcode::Value => self.read_inline_value(cursor, depth),
            Opcode::NormalSubstitution => Ok(self
                .resolve_substitution(cursor, substitutions, false)?
                .unwrap_or(Value::Null)),
            Opcode::OptionalSubstitution => Ok(self
                .resolve_substitution(cursor, substitutions, true)?
                .unwrap_or(Value::Null)),
            _ => Err(EvtxError::decode(
                DecodeErrorKind::UnknownOpcode(byte),
                cursor.pos() as u64 - 1,
            )),
        }
    }

    fn resolve_substitution(
        &mut self,
        cursor: &mut ByteCursor<'_>,
        substitutions: Option<&[Value]>,
        optional: bool,
    ) -> crate::err::Result<Option<Value>> {
        let substitution_index = cursor.u16()?;
        let type_byte = cursor.u8()?;
        let _ = ValueType::from_byte(type_byte).ok_or_else(|| {
            EvtxError::decode(
                DecodeErrorKind::BadValueType(type_byte),
                cursor.pos() as u64 - 1,
            )
        })?;

        let values = substitutions.ok_or_else(|| {
            EvtxError::decode(
                DecodeErrorKind::BadSubstitutionIndex(substitution_index),
                cursor.pos() as u64,
            )
        })?;
        let value = values.get(substitution_index as usize).ok_or_else(|| {
            EvtxError::decode(
                DecodeErrorKind::BadSubstitutionIndex(substitution_index),
                cursor.pos() as u64,
            )
        })?;

        if optional && matches!(value, Value::Null) {
            return Ok(None);
        }
        Ok(Some(value.clone()))
    }

    /// Decode an inline `Value` token: type byte, then self-delimited data.
    /// `BinXml`/`EvtXml` are not reachable here (§3 notes they require a
    /// known byte length, available only through a substitution descriptor).
    fn read_inline_value(&mut self, cursor: &mut ByteCursor<'_>, _depth: usize) -> crate::err::Result<Value> {
        let type_byte = cursor.u8()?;
        if type_byte & value::ARRAY_FLAG != 0 {
            return Err(EvtxError::decode(
                DecodeErrorKind::BadValueType(type_byte),
                cursor.pos() as u64 - 1,
            ));
        }
        let value_type = ValueType::from_byte(type_byte).ok_or_else(|| {
            EvtxError::decode(
                DecodeErrorKind::BadValueType(type_byte),
                cursor.pos() as u64 - 1,
            )
        })?;
        value::decode_scalar(value_type, cursor, self.config.code_page)
    }

    fn decode_template_instance(
        &mut self,
        cursor: &mut ByteCursor<'_>,
        tree: &mut Tree,
        stack: &mut Vec<NodeId>,
        depth: usize,
    ) -> crate::err::Result<()> {
        if depth >= self.config.max_nesting_depth {
            return Err(EvtxError::decode(
                DecodeErrorKind::NestingTooDeep(self.config.max_nesting_depth),
                cursor.pos() as u64,
            ));
        }

        let _unknown = cursor.u8()?;
        let _template_id = cursor.u32()?;
        let template_definition_data_offset = cursor.u32()?;

        let definition = if template_definition_data_offset as usize == cursor.pos() {
            let def = self.read_template_definition(cursor)?;
            self.templates.insert(template_definition_data_offset, def);
            def
        } else if let Some(cached) = self.templates.get(template_definition_data_offset) {
            cached
        } else {
            let return_to = cursor.pos();
            cursor.set_pos(template_definition_data_offset as usize)?;
            let def = self.read_template_definition(cursor)?;
            self.templates.insert(template_definition_data_offset, def);
            cursor.set_pos(return_to)?;
            def
        };

        let number_of_substitutions = cursor.u32()? as usize;
        let mut descriptors = Vec::with_capacity(number_of_substitutions);
        for _ in 0..number_of_substitutions {
            let size = cursor.u16()?;
            let type_byte = cursor.u8()?;
            let _padding = cursor.u8()?;
            let base_type = ValueType::from_byte(type_byte & !value::ARRAY_FLAG).ok_or_else(|| {
                EvtxError::decode(
                    DecodeErrorKind::BadValueType(type_byte),
                    cursor.pos() as u64,
                )
            })?;
            descriptors.push((
                TemplateValueDescriptor {
                    size,
                    value_type: base_type,
                },
                type_byte & value::ARRAY_FLAG != 0,
            ));
        }

        let mut substitution_array = Vec::with_capacity(descriptors.len());
        for (descriptor, is_array) in descriptors {
            let value = self.decode_substitution_value(cursor, &descriptor, is_array, depth)?;
            substitution_array.push(value);
        }

        let mut body_cursor = ByteCursor::with_pos(self.buf, definition.body_offset)?;
        self.run(
            &mut body_cursor,
            definition.body_offset + definition.body_len,
            tree,
            stack,
            Some(&substitution_array),
            depth + 1,
        )
    }

    /// Read a template definition at the cursor's current position:
    /// `next_template_offset:u32, guid:16, data_size:u32`, then the body
    /// token stream spanning `data_size` bytes, per §4.2.
    fn read_template_definition(
        &mut self,
        cursor: &mut ByteCursor<'_>,
    ) -> crate::err::Result<TemplateDefinition> {
        let _next_template_offset = cursor.u32()?;
        let guid = Guid::from_bytes(&cursor.array::<16>()?);
        let data_size = cursor.u32()?;
        let body_offset = cursor.pos();

        cursor.advance(data_size as usize)?;

        Ok(TemplateDefinition {
            guid,
            body_offset,
            body_len: data_size as usize,
        })
    }

    fn decode_substitution_value(
        &mut self,
        cursor: &mut ByteCursor<'_>,
        descriptor: &TemplateValueDescriptor,
        is_array: bool,
        depth: usize,
    ) -> crate::err::Result<Value> {
        let start = cursor.pos();

        if descriptor.value_type == ValueType::Null {
            cursor.advance(descriptor.size as usize)?;
            return Ok(Value::Null);
        }

        if matches!(descriptor.value_type, ValueType::BinXml | ValueType::EvtXml) {
            if depth >= self.config.max_nesting_depth {
                return Err(EvtxError::decode(
                    DecodeErrorKind::NestingTooDeep(self.config.max_nesting_depth),
                    cursor.pos() as u64,
                ));
            }
            let nested_start = cursor.pos();
            let nested_end = nested_start + descriptor.size as usize;
            let nested = decode_fragment(self.buf, nested_start, nested_end, self.config)?;
            cursor.set_pos(nested_end)?;
            return Ok(if descriptor.value_type == ValueType::BinXml {
                Value::BinXml(nested)
            } else {
                Value::EvtXml(nested)
            });
        }

        if !is_array {
            let v = value::decode_scalar(descriptor.value_type, cursor, self.config.code_page)?;
            self.skip_to_descriptor_end(cursor, start, descriptor.size)?;
            return Ok(v);
        }

        let end = start + descriptor.size as usize;
        let mut items = Vec::new();
        if descriptor.value_type == ValueType::String {
            // String-array elements are NUL-terminated UTF-16 packed
            // back-to-back, unlike a standalone `String` value or the other
            // scalar types here, all of which are either fixed-width or
            // self-length-prefixed on the wire. Looping `decode_scalar`
            // would misread the first element's leading code unit as a
            // `u16` length prefix.
            while cursor.pos() < end {
                items.push(Value::String(cursor.nul_terminated_utf16_string(end)?));
            }
        } else {
            while (cursor.pos() - start) < descriptor.size as usize {
                items.push(value::decode_scalar(
                    descriptor.value_type,
                    cursor,
                    self.config.code_page,
                )?);
            }
        }
        self.skip_to_descriptor_end(cursor, start, descriptor.size)?;
        Ok(Value::Array(items))
    }

    /// After decoding a self-delimited value, land exactly on the
    /// descriptor-declared boundary: forward if the self-delimited read
    /// under-consumed (defensive against a slightly generous descriptor
    /// size), error if it over-consumed.
    fn skip_to_descriptor_end(
        &self,
        cursor: &mut ByteCursor<'_>,
        start: usize,
        size: u16,
    ) -> crate::err::Result<()> {
        let end = start + size as usize;
        if cursor.pos() > end {
            return Err(EvtxError::decode(
                DecodeErrorKind::TruncatedStream,
                cursor.pos() as u64,
            ));
        }
        cursor.set_pos(end)
    }
}
