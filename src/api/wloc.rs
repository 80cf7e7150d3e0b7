//! Encoder and decoder for Apple's `wloc` location protocol.
//!
//! A request is a fixed big-endian envelope (version, locale, client id, OS version,
//! request code) wrapping a protobuf-encoded query. A response is a 10-byte header
//! followed by a protobuf-encoded list of access points. Only the handful of fields
//! needed for a lookup are modelled; everything else is skipped on decode.
//!
//! The decoder never indexes past the end of its input. Every read is checked and
//! malformed data surfaces as a [`WireError`].

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Bytes preceding the protobuf payload in every response.
pub const RESPONSE_HEADER_LEN: usize = 10;

/// Fixed-point scale of latitude and longitude values.
pub const COORDINATE_SCALE: f64 = 100_000_000.0;

const ENVELOPE_VERSION: u16 = 1;
const REQUEST_CODE: u16 = 1;

// Query message fields.
const QUERY_WIFI_DEVICES: u64 = 2;
const QUERY_NOISE: u64 = 3;
const QUERY_RETURN_SINGLE_RESULT: u64 = 4;

// Response message fields.
const RESPONSE_WIFI_DEVICES: u64 = 2;
const DEVICE_BSSID: u64 = 1;
const DEVICE_LOCATION: u64 = 2;
const LOCATION_LATITUDE: u64 = 1;
const LOCATION_LONGITUDE: u64 = 2;
const LOCATION_ACCURACY: u64 = 3;

const WIRE_VARINT: u8 = 0;
const WIRE_FIXED64: u8 = 1;
const WIRE_LEN: u8 = 2;
const WIRE_FIXED32: u8 = 5;

const MAX_VARINT_LEN: usize = 10;

/// Failure to encode or decode a `wloc` message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("response is {actual} bytes, shorter than the {expected}-byte header")]
    ShortHeader { expected: usize, actual: usize },

    #[error("message truncated at offset {offset}: {needed} more bytes required")]
    Truncated { offset: usize, needed: usize },

    #[error("varint at offset {0} is longer than 10 bytes")]
    VarintOverflow(usize),

    #[error("unsupported wire type {wire_type} for field {field} at offset {offset}")]
    InvalidWireType {
        field: u64,
        wire_type: u8,
        offset: usize,
    },

    #[error("length {0} does not fit the field it is encoded in")]
    LengthOverflow(u64),

    #[error("access point BSSID is not valid UTF-8")]
    InvalidUtf8,
}

/// A single-BSSID lookup request.
#[derive(Debug, Clone)]
pub struct WlocRequest<'a> {
    pub locale: &'a str,
    pub client_id: &'a str,
    pub os_version: &'a str,
    pub bssid: &'a str,
}

impl WlocRequest<'_> {
    /// Serializes the request into the body of the HTTP POST.
    pub fn encode(&self) -> Result<Bytes, WireError> {
        let query = self.encode_query();

        let mut buf = BytesMut::with_capacity(
            32 + self.locale.len() + self.client_id.len() + self.os_version.len() + query.len(),
        );
        buf.put_u16(ENVELOPE_VERSION);
        put_prefixed_str(&mut buf, self.locale)?;
        put_prefixed_str(&mut buf, self.client_id)?;
        put_prefixed_str(&mut buf, self.os_version)?;
        buf.put_u16(0);
        buf.put_u16(REQUEST_CODE);
        let query_len =
            u32::try_from(query.len()).map_err(|_| WireError::LengthOverflow(query.len() as u64))?;
        buf.put_u32(query_len);
        buf.put_slice(&query);

        Ok(buf.freeze())
    }

    fn encode_query(&self) -> BytesMut {
        let mut device = BytesMut::new();
        put_len_field(&mut device, DEVICE_BSSID, self.bssid.as_bytes());

        let mut query = BytesMut::new();
        put_len_field(&mut query, QUERY_WIFI_DEVICES, &device);
        put_varint_field(&mut query, QUERY_NOISE, 0);
        put_varint_field(&mut query, QUERY_RETURN_SINGLE_RESULT, 1);
        query
    }
}

fn put_prefixed_str(buf: &mut BytesMut, value: &str) -> Result<(), WireError> {
    let len = u16::try_from(value.len()).map_err(|_| WireError::LengthOverflow(value.len() as u64))?;
    buf.put_u16(len);
    buf.put_slice(value.as_bytes());
    Ok(())
}

fn put_key(buf: &mut BytesMut, field: u64, wire_type: u8) {
    put_varint(buf, (field << 3) | u64::from(wire_type));
}

fn put_varint_field(buf: &mut BytesMut, field: u64, value: u64) {
    put_key(buf, field, WIRE_VARINT);
    put_varint(buf, value);
}

fn put_len_field(buf: &mut BytesMut, field: u64, value: &[u8]) {
    put_key(buf, field, WIRE_LEN);
    put_varint(buf, value.len() as u64);
    buf.put_slice(value);
}

fn put_varint(buf: &mut BytesMut, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Fixed-point position as reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WlocLocation {
    pub latitude: i64,
    pub longitude: i64,
    pub accuracy: Option<i64>,
}

impl WlocLocation {
    pub fn latitude_degrees(&self) -> f64 {
        self.latitude as f64 / COORDINATE_SCALE
    }

    pub fn longitude_degrees(&self) -> f64 {
        self.longitude as f64 / COORDINATE_SCALE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WlocDevice {
    pub bssid: String,
    pub location: WlocLocation,
}

/// Decoded response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WlocResponse {
    pub devices: Vec<WlocDevice>,
}

impl WlocResponse {
    /// Decodes a full HTTP response body, header included.
    pub fn decode(body: &[u8]) -> Result<Self, WireError> {
        let payload = body
            .get(RESPONSE_HEADER_LEN..)
            .ok_or(WireError::ShortHeader {
                expected: RESPONSE_HEADER_LEN,
                actual: body.len(),
            })?;
        Self::decode_payload(payload)
    }

    fn decode_payload(payload: &[u8]) -> Result<Self, WireError> {
        let mut reader = Reader::new(payload, RESPONSE_HEADER_LEN);
        let mut response = WlocResponse::default();

        while let Some((field, wire_type, offset)) = reader.read_key()? {
            match field {
                RESPONSE_WIFI_DEVICES => {
                    let nested = reader.read_len_delimited(field, wire_type, offset)?;
                    response.devices.push(decode_device(nested)?);
                },
                _ => reader.skip(field, wire_type, offset)?,
            }
        }

        Ok(response)
    }
}

fn decode_device(mut reader: Reader<'_>) -> Result<WlocDevice, WireError> {
    let mut device = WlocDevice::default();

    while let Some((field, wire_type, offset)) = reader.read_key()? {
        match field {
            DEVICE_BSSID => {
                let raw = reader.read_len_delimited(field, wire_type, offset)?;
                device.bssid = std::str::from_utf8(raw.buf)
                    .map_err(|_| WireError::InvalidUtf8)?
                    .to_string();
            },
            DEVICE_LOCATION => {
                let nested = reader.read_len_delimited(field, wire_type, offset)?;
                device.location = decode_location(nested)?;
            },
            _ => reader.skip(field, wire_type, offset)?,
        }
    }

    Ok(device)
}

fn decode_location(mut reader: Reader<'_>) -> Result<WlocLocation, WireError> {
    let mut location = WlocLocation::default();

    while let Some((field, wire_type, offset)) = reader.read_key()? {
        match field {
            LOCATION_LATITUDE => location.latitude = reader.read_int64(field, wire_type, offset)?,
            LOCATION_LONGITUDE => location.longitude = reader.read_int64(field, wire_type, offset)?,
            LOCATION_ACCURACY => {
                location.accuracy = Some(reader.read_int64(field, wire_type, offset)?)
            },
            _ => reader.skip(field, wire_type, offset)?,
        }
    }

    Ok(location)
}

/// Bounds-checked cursor over a protobuf-encoded slice.
///
/// `base` is the absolute offset of `buf` within the response, so error offsets
/// point into the original body.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8], base: usize) -> Self {
        Self { buf, pos: 0, base }
    }

    fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn read_varint(&mut self) -> Result<u64, WireError> {
        let start = self.offset();
        let mut value = 0u64;

        for i in 0..MAX_VARINT_LEN {
            let byte = *self.buf.get(self.pos).ok_or(WireError::Truncated {
                offset: self.offset(),
                needed: 1,
            })?;
            self.pos += 1;
            // The tenth byte only has room for bit 63.
            if i == MAX_VARINT_LEN - 1 && byte > 1 {
                return Err(WireError::VarintOverflow(start));
            }
            value |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }

        Err(WireError::VarintOverflow(start))
    }

    /// Reads the next field key, or `None` at a clean end of message.
    fn read_key(&mut self) -> Result<Option<(u64, u8, usize)>, WireError> {
        if self.pos >= self.buf.len() {
            return Ok(None);
        }
        let offset = self.offset();
        let key = self.read_varint()?;
        let field = key >> 3;
        let wire_type = (key & 0x07) as u8;
        if field == 0 {
            return Err(WireError::InvalidWireType {
                field,
                wire_type,
                offset,
            });
        }
        Ok(Some((field, wire_type, offset)))
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        let remaining = self.buf.len() - self.pos;
        if len > remaining {
            return Err(WireError::Truncated {
                offset: self.offset(),
                needed: len - remaining,
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_len(&mut self) -> Result<usize, WireError> {
        let len = self.read_varint()?;
        usize::try_from(len).map_err(|_| WireError::LengthOverflow(len))
    }

    fn read_len_delimited(
        &mut self,
        field: u64,
        wire_type: u8,
        offset: usize,
    ) -> Result<Reader<'a>, WireError> {
        expect_wire_type(field, wire_type, WIRE_LEN, offset)?;
        let len = self.read_len()?;
        let base = self.offset();
        let buf = self.take(len)?;
        Ok(Reader::new(buf, base))
    }

    fn read_int64(&mut self, field: u64, wire_type: u8, offset: usize) -> Result<i64, WireError> {
        expect_wire_type(field, wire_type, WIRE_VARINT, offset)?;
        // int64 is two's complement on the wire; negatives take all ten bytes.
        Ok(self.read_varint()? as i64)
    }

    fn skip(&mut self, field: u64, wire_type: u8, offset: usize) -> Result<(), WireError> {
        match wire_type {
            WIRE_VARINT => self.read_varint().map(drop),
            WIRE_FIXED64 => self.take(8).map(drop),
            WIRE_LEN => {
                let len = self.read_len()?;
                self.take(len).map(drop)
            },
            WIRE_FIXED32 => self.take(4).map(drop),
            _ => Err(WireError::InvalidWireType {
                field,
                wire_type,
                offset,
            }),
        }
    }
}

fn expect_wire_type(field: u64, actual: u8, expected: u8, offset: usize) -> Result<(), WireError> {
    if actual == expected {
        Ok(())
    } else {
        Err(WireError::InvalidWireType {
            field,
            wire_type: actual,
            offset,
        })
    }
}
