use serde::Serialize;

use crate::error::Result;
use crate::items::{
    attribute_values_len, first_foreign_attribute, put_attribute_values, read_attribute_values,
    AttributeValue,
};
use crate::pdu::{put_attribute_ids, read_attribute_ids, Pdu, PduId};
use crate::reader::FieldReader;
use crate::types::{Scope, StatusCode};
use crate::writer::FieldWriter;

/// Fetch media attributes of the item `uid` in `scope`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetItemAttributesCommand {
    pub scope: Scope,
    pub uid: u64,
    pub uid_counter: u16,
    /// Requested attribute ids; empty asks for all of them.
    pub attributes: Vec<u32>,
}

impl GetItemAttributesCommand {
    /// Operand bytes before the attribute id list.
    pub const FIXED_PARAMETER_LENGTH: usize = 1 + 8 + 2 + 1;
}

impl Pdu for GetItemAttributesCommand {
    const PDU_ID: PduId = PduId::GetItemAttributes;
    const MIN_PARAMETER_LENGTH: usize = Self::FIXED_PARAMETER_LENGTH;

    fn parameter_length(&self) -> usize {
        Self::FIXED_PARAMETER_LENGTH + 4 * self.attributes.len()
    }

    fn encode_parameters(&self, writer: &mut FieldWriter<'_>) -> Result<()> {
        writer.put_u8(self.scope as u8)?;
        writer.put_u64(self.uid)?;
        writer.put_u16(self.uid_counter)?;
        put_attribute_ids(writer, &self.attributes)
    }

    fn decode_parameters(reader: &mut FieldReader<'_>) -> Result<Self> {
        let scope = Scope::try_from(reader.u8("scope")?)?;
        let uid = reader.u64("uid")?;
        let uid_counter = reader.u16("uid counter")?;
        let attributes = read_attribute_ids(reader)?;
        Ok(Self {
            scope,
            uid,
            uid_counter,
            attributes,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GetItemAttributesResponse {
    pub status: u8,
    pub attributes: Vec<AttributeValue>,
}

impl GetItemAttributesResponse {
    pub fn status_code(&self) -> Option<StatusCode> {
        StatusCode::from_u8(self.status)
    }

    /// Value of `attribute_id`, if the target returned it.
    pub fn get(&self, attribute_id: u32) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.attribute_id == attribute_id)
            .map(|attr| attr.value.as_str())
    }

    pub fn character_set_mismatch(&self) -> bool {
        self.foreign_character_set().is_some()
    }

    pub fn foreign_character_set(&self) -> Option<u16> {
        first_foreign_attribute(&self.attributes)
    }
}

impl Pdu for GetItemAttributesResponse {
    const PDU_ID: PduId = PduId::GetItemAttributes;
    // status, attribute count
    const MIN_PARAMETER_LENGTH: usize = 1 + 1;

    fn parameter_length(&self) -> usize {
        1 + attribute_values_len(&self.attributes)
    }

    fn encode_parameters(&self, writer: &mut FieldWriter<'_>) -> Result<()> {
        writer.put_u8(self.status)?;
        put_attribute_values(writer, &self.attributes)
    }

    fn decode_parameters(reader: &mut FieldReader<'_>) -> Result<Self> {
        let status = reader.u8("status")?;
        let attributes = read_attribute_values(reader)?;
        Ok(Self { status, attributes })
    }
}
