use crate::error::DecodeError;
use crate::util::read_variable_length;

/// Sequential reader over a region with a declared end.
///
/// Reads never go past `end`; a read that would is a length mismatch
/// reporting how far the event wanted to go.
#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> ByteReader<'a> {
        ByteReader { data, offset: 0 }
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.offset
    }

    #[inline(always)]
    pub fn end(&self) -> usize {
        self.data.len()
    }

    #[inline(always)]
    pub fn is_at_end(&self) -> bool {
        self.offset >= self.data.len()
    }

    fn overrun(&self, wanted: usize) -> DecodeError {
        DecodeError::TrackLengthMismatch { declared: self.data.len(), consumed: self.offset.saturating_add(wanted) }
    }

    pub fn peek_u8(&self) -> Result<u8, DecodeError> {
        self.data.get(self.offset).copied().ok_or_else(|| self.overrun(1))
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let byte = self.peek_u8()?;
        self.offset += 1;
        Ok(byte)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let bytes = self
            .offset
            .checked_add(len)
            .and_then(|stop| self.data.get(self.offset..stop))
            .ok_or_else(|| self.overrun(len))?;
        self.offset += len;
        Ok(bytes)
    }

    /// Reads a VLQ that must end inside the region.
    ///
    /// A quantity cut off by the region end is a length mismatch; one that
    /// is terminated but wider than 32 bits is malformed.
    pub fn read_variable_length(&mut self) -> Result<u32, DecodeError> {
        let rest = &self.data[self.offset.min(self.data.len())..];
        let (bytes, value) = match read_variable_length(rest) {
            Some(read) => read,
            None if rest.iter().all(|&b| b & 0x80 != 0) => return Err(self.overrun(rest.len() + 1)),
            None => return Err(DecodeError::MalformedLength { offset: self.offset }),
        };
        self.offset += bytes;
        Ok(value)
    }

    /// Reads up to and including the next 0xF7, returning the bytes before it.
    pub fn read_until_terminator(&mut self, start: usize) -> Result<&'a [u8], DecodeError> {
        let rest = &self.data[self.offset.min(self.data.len())..];
        let len = rest.iter().position(|&b| b == 0xF7).ok_or(DecodeError::MalformedSysex { offset: start })?;
        let payload = &rest[..len];
        self.offset += len + 1;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_advance() {
        let mut reader = ByteReader::new(&[0x81, 0x00, 0x90, 0x40, 0x7F]);
        assert_eq!(reader.read_variable_length(), Ok(0x80));
        assert_eq!(reader.peek_u8(), Ok(0x90));
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.read_u8(), Ok(0x90));
        assert_eq!(reader.read_bytes(2), Ok(&[0x40, 0x7F][..]));
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_overrun_reports_wanted_length() {
        let mut reader = ByteReader::new(&[0x90, 0x40]);
        reader.read_u8().unwrap();
        assert_eq!(reader.read_bytes(2), Err(DecodeError::TrackLengthMismatch { declared: 2, consumed: 3 }));
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn test_vlq_cut_off_by_region_end() {
        let mut reader = ByteReader::new(&[0x00, 0x81]);
        reader.read_u8().unwrap();
        assert_eq!(reader.read_variable_length(), Err(DecodeError::TrackLengthMismatch { declared: 2, consumed: 3 }));
        reader.read_u8().unwrap();
        assert_eq!(reader.read_variable_length(), Err(DecodeError::TrackLengthMismatch { declared: 2, consumed: 3 }));
    }

    #[test]
    fn test_vlq_wider_than_32_bits() {
        let mut reader = ByteReader::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0x7F]);
        assert_eq!(reader.read_variable_length(), Err(DecodeError::MalformedLength { offset: 0 }));
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_overrun_saturates() {
        let mut reader = ByteReader::new(&[0x00, 0x01]);
        reader.read_u8().unwrap();
        assert_eq!(
            reader.read_bytes(usize::MAX),
            Err(DecodeError::TrackLengthMismatch { declared: 2, consumed: usize::MAX })
        );
    }

    #[test]
    fn test_read_until_terminator() {
        let mut reader = ByteReader::new(&[0x43, 0x12, 0x00, 0xF7, 0x00]);
        assert_eq!(reader.read_until_terminator(0), Ok(&[0x43, 0x12, 0x00][..]));
        assert_eq!(reader.position(), 4);
        assert_eq!(reader.read_until_terminator(4), Err(DecodeError::MalformedSysex { offset: 4 }));
    }
}
