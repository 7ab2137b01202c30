// In: src/exchange/memory.rs

//! An in-memory row exchange.
//!
//! Rows are kept back to back in one byte vector, exactly as they would sit in
//! an uncompressed data section. The same value serves as a source (reading an
//! existing buffer) and as a sink (collecting written rows).

use crate::dictionary::Dictionary;
use crate::error::SavCaseError;
use crate::exchange::{CellValue, CodecContext, ColumnHandle, RowSink, RowSource, SessionInfo, StatusCode};
use crate::kernels::float8;
use crate::layout::{ByteOrder, ColumnPlacement, RowLayout};
use crate::config::ColumnSelection;
use crate::types::StorageKind;

#[derive(Debug, Clone)]
pub struct MemoryCaseFile {
    session: SessionInfo,
    placements: Vec<ColumnPlacement>,
    blank: Vec<u8>,
    data: Vec<u8>,
    cursor: u64,
    pending: Option<Vec<u8>>,
    closed: bool,
    close_calls: usize,
}

impl MemoryCaseFile {
    /// An empty file ready to receive rows for `dictionary`.
    pub fn new(dictionary: &Dictionary, context: CodecContext, byte_order: ByteOrder) -> Self {
        let layout = RowLayout::build(dictionary, &ColumnSelection::All, byte_order);
        Self {
            session: SessionInfo {
                row_size: layout.row_size(),
                byte_order,
                case_count: 0,
                context,
            },
            placements: layout.placements().to_vec(),
            blank: layout.blank_row(&context),
            data: Vec::new(),
            cursor: 0,
            pending: None,
            closed: false,
            close_calls: 0,
        }
    }

    /// A file holding the rows in `data`, which must be a whole number of rows.
    pub fn from_rows(
        dictionary: &Dictionary,
        context: CodecContext,
        byte_order: ByteOrder,
        data: Vec<u8>,
    ) -> Result<Self, SavCaseError> {
        let mut file = Self::new(dictionary, context, byte_order);
        let row_size = file.session.row_size;
        if row_size == 0 || data.len() % row_size != 0 {
            return Err(SavCaseError::InvalidRowBuffer {
                expected: row_size,
                actual: data.len(),
            });
        }
        file.session.case_count = (data.len() / row_size) as u64;
        file.data = data;
        Ok(file)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Row `idx`, if present.
    pub fn row(&self, idx: usize) -> Option<&[u8]> {
        let size = self.session.row_size;
        self.data.get(idx * size..(idx + 1) * size)
    }

    /// How many times `close` has been called.
    pub fn close_calls(&self) -> usize {
        self.close_calls
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), StatusCode> {
        if self.closed {
            Err(StatusCode::INVALID_HANDLE)
        } else {
            Ok(())
        }
    }

    fn push_row(&mut self, row: &[u8]) {
        self.data.extend_from_slice(row);
        self.session.case_count += 1;
    }
}

impl RowSource for MemoryCaseFile {
    fn session(&self) -> &SessionInfo {
        &self.session
    }

    fn read_next_row(&mut self, buf: &mut [u8]) -> Result<(), StatusCode> {
        self.ensure_open()?;
        if buf.len() != self.session.row_size {
            return Err(StatusCode::BUFFER_SHORT);
        }
        if self.cursor >= self.session.case_count {
            return Err(StatusCode::FILE_END);
        }
        let start = self.cursor as usize * self.session.row_size;
        buf.copy_from_slice(&self.data[start..start + self.session.row_size]);
        self.cursor += 1;
        Ok(())
    }

    fn seek(&mut self, row: u64) -> Result<(), StatusCode> {
        self.ensure_open()?;
        if row > self.session.case_count {
            return Err(StatusCode::INVALID_CASE);
        }
        self.cursor = row;
        Ok(())
    }

    fn close(&mut self) -> Result<(), StatusCode> {
        self.close_calls += 1;
        self.ensure_open()?;
        self.closed = true;
        Ok(())
    }
}

impl RowSink for MemoryCaseFile {
    fn session(&self) -> &SessionInfo {
        &self.session
    }

    fn write_row(&mut self, row: &[u8]) -> Result<(), StatusCode> {
        self.ensure_open()?;
        if row.len() != self.session.row_size {
            return Err(StatusCode::BUFFER_SHORT);
        }
        self.push_row(row);
        Ok(())
    }

    fn set_value(&mut self, column: ColumnHandle, value: CellValue<'_>) -> Result<(), StatusCode> {
        self.ensure_open()?;
        let placement = *self
            .placements
            .get(column.0)
            .ok_or(StatusCode::INVALID_VARHANDLE)?;
        let order = self.session.byte_order;
        let blank = &self.blank;
        let row = self.pending.get_or_insert_with(|| blank.clone());
        let field = &mut row[placement.offset..placement.offset + placement.width];

        match (placement.storage, value) {
            (StorageKind::Numeric, CellValue::Number(v)) => float8::write_f64(field, v, order),
            (StorageKind::String(declared), CellValue::Text(bytes)) => {
                if bytes.len() > declared {
                    return Err(StatusCode::EXC_STRVALUE);
                }
                field[..bytes.len()].copy_from_slice(bytes);
                field[bytes.len()..].fill(b' ');
            }
            (StorageKind::Numeric, CellValue::Text(_)) => return Err(StatusCode::NUME_EXP),
            (StorageKind::String(_), CellValue::Number(_)) => return Err(StatusCode::STR_EXP),
        }
        Ok(())
    }

    fn commit_row(&mut self) -> Result<(), StatusCode> {
        self.ensure_open()?;
        let row = self.pending.take().unwrap_or_else(|| self.blank.clone());
        self.push_row(&row);
        Ok(())
    }

    fn close(&mut self) -> Result<(), StatusCode> {
        RowSource::close(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnDescriptor;

    fn dictionary() -> Dictionary {
        Dictionary::new(vec![
            ColumnDescriptor::numeric("x"),
            ColumnDescriptor::string("s", 3),
        ])
        .unwrap()
    }

    #[test]
    fn test_read_until_file_end() {
        let data = vec![7u8; 32];
        let mut file =
            MemoryCaseFile::from_rows(&dictionary(), CodecContext::default(), ByteOrder::Little, data)
                .unwrap();
        let mut buf = vec![0u8; 16];
        assert_eq!(file.read_next_row(&mut buf), Ok(()));
        assert_eq!(file.read_next_row(&mut buf), Ok(()));
        assert_eq!(file.read_next_row(&mut buf), Err(StatusCode::FILE_END));
        file.seek(1).unwrap();
        assert_eq!(file.read_next_row(&mut buf), Ok(()));
    }

    #[test]
    fn test_partial_rows_are_rejected() {
        let res = MemoryCaseFile::from_rows(
            &dictionary(),
            CodecContext::default(),
            ByteOrder::Little,
            vec![0u8; 20],
        );
        assert!(matches!(res, Err(SavCaseError::InvalidRowBuffer { .. })));
    }

    #[test]
    fn test_set_value_and_commit() {
        let ctx = CodecContext::default();
        let mut file = MemoryCaseFile::new(&dictionary(), ctx, ByteOrder::Little);

        file.set_value(ColumnHandle(1), CellValue::Text(b"ab")).unwrap();
        file.commit_row().unwrap();

        let row = file.row(0).unwrap();
        assert_eq!(float8::read_f64(&row[0..8], ByteOrder::Little), ctx.system_missing);
        assert_eq!(&row[8..16], b"ab      ");
        assert_eq!(RowSink::session(&file).case_count, 1);

        assert_eq!(
            file.set_value(ColumnHandle(0), CellValue::Text(b"x")),
            Err(StatusCode::NUME_EXP)
        );
        assert_eq!(
            file.set_value(ColumnHandle(1), CellValue::Text(b"toolong")),
            Err(StatusCode::EXC_STRVALUE)
        );
    }

    #[test]
    fn test_close_twice_reports_invalid_handle() {
        let mut file = MemoryCaseFile::new(&dictionary(), CodecContext::default(), ByteOrder::Little);
        assert_eq!(RowSource::close(&mut file), Ok(()));
        assert_eq!(RowSource::close(&mut file), Err(StatusCode::INVALID_HANDLE));
        assert_eq!(file.close_calls(), 2);
    }
}
