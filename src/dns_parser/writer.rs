use byteorder::{BigEndian, ByteOrder};

use super::Error;

/// A growable output buffer with an explicit cursor
///
/// Writes happen at the cursor. Writing past the end of the buffer grows
/// it; `extend` grows it explicitly. Growing copies the existing content
/// and leaves the cursor where it was.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
    pos: usize,
}

impl Writer {
    pub fn new() -> Writer {
        Writer::with_capacity(512)
    }

    /// Creates a writer with a zeroed buffer of `len` bytes.
    pub fn with_capacity(len: usize) -> Writer {
        Writer {
            buf: vec![0; len],
            pos: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Length of the underlying buffer, written or not.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Extends the buffer by `additional` zero bytes.
    pub fn extend(&mut self, additional: usize) {
        let mut grown = vec![0; self.buf.len() + additional];
        grown[..self.buf.len()].copy_from_slice(&self.buf);
        self.buf = grown;
    }

    fn reserve(&mut self, len: usize) {
        let needed = self.pos + len;
        if needed > self.buf.len() {
            let additional = (needed - self.buf.len()).max(self.buf.len());
            self.extend(additional);
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len());
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    pub fn write_u16(&mut self, value: u16) {
        let mut bytes = [0u8; 2];
        BigEndian::write_u16(&mut bytes, value);
        self.write_bytes(&bytes);
    }

    pub fn write_u32(&mut self, value: u32) {
        let mut bytes = [0u8; 4];
        BigEndian::write_u32(&mut bytes, value);
        self.write_bytes(&bytes);
    }

    /// Overwrites two already written bytes at `offset`.
    pub fn write_u16_at(&mut self, offset: usize, value: u16) {
        debug_assert!(offset + 2 <= self.pos);
        BigEndian::write_u16(&mut self.buf[offset..offset + 2], value);
    }

    /// Writes a length octet followed by `data`.
    pub fn write_character_string(&mut self, data: &[u8]) -> Result<(), Error> {
        if data.len() > 255 {
            return Err(Error::CharacterStringTooLong { len: data.len() });
        }
        self.write_u8(data.len() as u8);
        self.write_bytes(data);
        Ok(())
    }

    /// The bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf[..self.pos]
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        self.buf.truncate(self.pos);
        self.buf
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn writes_network_order() {
        let mut writer = Writer::new();
        writer.write_u16(0x1234);
        writer.write_u32(0xdead_beef);
        writer.write_character_string(b"ab").unwrap();
        assert_eq!(
            writer.into_bytes(),
            vec![0x12, 0x34, 0xde, 0xad, 0xbe, 0xef, 2, b'a', b'b']
        );
    }

    #[test]
    fn extend_keeps_content_and_cursor() {
        let mut writer = Writer::with_capacity(4);
        writer.write_u16(0xabcd);
        writer.extend(8);
        assert_eq!(writer.capacity(), 12);
        assert_eq!(writer.position(), 2);
        assert_eq!(writer.as_slice(), &[0xab, 0xcd]);
    }

    #[test]
    fn grows_on_demand() {
        let mut writer = Writer::with_capacity(2);
        writer.write_bytes(&[7; 5]);
        writer.write_u16_at(1, 0x0102);
        assert!(writer.capacity() >= 5);
        assert_eq!(writer.as_slice(), &[7, 1, 2, 7, 7]);
    }

    #[test]
    fn rejects_long_character_string() {
        let mut writer = Writer::new();
        assert_eq!(
            writer.write_character_string(&[0; 256]),
            Err(Error::CharacterStringTooLong { len: 256 })
        );
        assert_eq!(writer.position(), 0);
    }
}
