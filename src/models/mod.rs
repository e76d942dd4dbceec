// Request and response models for the spreadsheet API

pub mod sheets;

pub use sheets::{
    ApiEnvelope, BatchValues, CellMatrix, GridProperties, KeyedValues, Payload, RangeRead,
    ReadOptions, SheetDescriptor, SheetMutationResult, SheetProperties, SheetReply,
    SheetRequest, SpreadsheetDescriptor, ValueRange, ValueRangeInput, ValueRenderOption,
    WriteResult,
};
