//! Bit cursor, writer and reader for packed field codes.
//!
//! Codes are [BIT_COUNT] bits wide and stored low-order first: code `i` lives
//! in bits `[5 * (i % 6), 5 * (i % 6) + 5)` of slot `i / 6`.

use crate::{
    constants::{BIT_COUNT, CODE_MASK, FIELDS_PER_SLOT, MAX_BITS_PER_SLOT},
    errors::ReadError,
};

/// Position of a code inside a packed slot array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitCursor {
    slot: usize,
    offset: u32,
}

impl BitCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor addressing the code of the field at `ordinal`.
    pub fn at(ordinal: usize) -> Self {
        Self {
            slot: ordinal / FIELDS_PER_SLOT,
            offset: (ordinal % FIELDS_PER_SLOT) as u32 * BIT_COUNT,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Bit offset inside the current slot.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Moves to the next code, wrapping to a fresh slot once [MAX_BITS_PER_SLOT] are used.
    pub fn advance(&mut self) {
        self.offset += BIT_COUNT;
        if self.offset >= MAX_BITS_PER_SLOT {
            self.slot += 1;
            self.offset = 0;
        }
    }
}

/// Number of slots needed to hold `fields` codes.
pub fn slots_for(fields: usize) -> usize {
    fields.div_ceil(FIELDS_PER_SLOT)
}

/// Places `code` at `offset` in `slot`.
pub fn insert_code(slot: u32, offset: u32, code: u8) -> u32 {
    slot | (u32::from(code & CODE_MASK) << offset)
}

/// Reads the code at `offset` in `slot`.
pub fn extract_code(slot: u32, offset: u32) -> u8 {
    ((slot >> offset) & u32::from(CODE_MASK)) as u8
}

/// Accumulates codes into packed slots.
#[derive(Debug, Default)]
pub struct BitWriter {
    slots: Vec<u32>,
    current: u32,
    cursor: BitCursor,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(fields: usize) -> Self {
        Self {
            slots: Vec::with_capacity(slots_for(fields)),
            ..Default::default()
        }
    }

    pub fn write_code(&mut self, code: u8) {
        self.current = insert_code(self.current, self.cursor.offset(), code);

        let slot = self.cursor.slot();
        self.cursor.advance();
        if self.cursor.slot() != slot {
            self.slots.push(self.current);
            self.current = 0;
        }
    }

    /// Flushes a partially filled slot and returns all slots.
    pub fn finish(mut self) -> Vec<u32> {
        if self.cursor.offset() > 0 {
            self.slots.push(self.current);
        }

        self.slots
    }
}

/// Reads codes back from packed slots in write order.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u32],
    cursor: BitCursor,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u32]) -> Self {
        Self {
            data,
            cursor: BitCursor::new(),
        }
    }

    pub fn read_code(&mut self) -> Result<u8, ReadError> {
        let slot = *self
            .data
            .get(self.cursor.slot())
            .ok_or(ReadError::OutOfBounds {
                slot: self.cursor.slot(),
                len: self.data.len(),
            })?;

        let code = extract_code(slot, self.cursor.offset());
        self.cursor.advance();

        Ok(code)
    }

    /// Reads the code at `ordinal` without moving the cursor.
    pub fn read_code_at(&self, ordinal: usize) -> Result<u8, ReadError> {
        let mut reader = BitReader {
            data: self.data,
            cursor: BitCursor::at(ordinal),
        };

        reader.read_code()
    }
}
