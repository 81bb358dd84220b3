use serde::Serialize;

use crate::error::Result;
use crate::pdu::{Pdu, PduId};
use crate::reader::FieldReader;
use crate::types::{Scope, StatusCode};
use crate::writer::FieldWriter;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetTotalNumberOfItemsCommand {
    pub scope: Scope,
}

impl Pdu for GetTotalNumberOfItemsCommand {
    const PDU_ID: PduId = PduId::GetTotalNumberOfItems;
    const MIN_PARAMETER_LENGTH: usize = 1;

    fn parameter_length(&self) -> usize {
        Self::MIN_PARAMETER_LENGTH
    }

    fn encode_parameters(&self, writer: &mut FieldWriter<'_>) -> Result<()> {
        writer.put_u8(self.scope as u8)
    }

    fn decode_parameters(reader: &mut FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            scope: Scope::try_from(reader.u8("scope")?)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GetTotalNumberOfItemsResponse {
    pub status: u8,
    pub uid_counter: u16,
    pub number_of_items: u32,
}

impl GetTotalNumberOfItemsResponse {
    pub fn status_code(&self) -> Option<StatusCode> {
        StatusCode::from_u8(self.status)
    }
}

impl Pdu for GetTotalNumberOfItemsResponse {
    const PDU_ID: PduId = PduId::GetTotalNumberOfItems;
    const MIN_PARAMETER_LENGTH: usize = 1 + 2 + 4;

    fn parameter_length(&self) -> usize {
        Self::MIN_PARAMETER_LENGTH
    }

    fn encode_parameters(&self, writer: &mut FieldWriter<'_>) -> Result<()> {
        writer.put_u8(self.status)?;
        writer.put_u16(self.uid_counter)?;
        writer.put_u32(self.number_of_items)
    }

    fn decode_parameters(reader: &mut FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            status: reader.u8("status")?,
            uid_counter: reader.u16("uid counter")?,
            number_of_items: reader.u32("number of items")?,
        })
    }
}
