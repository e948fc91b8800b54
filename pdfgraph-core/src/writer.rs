use crate::config::WriteOptions;
use crate::engine::WriteRequest;
use crate::error::{PdfError, Result};
use crate::filters;
use crate::objects::{Dictionary, Name, Object, ObjectId, PdfString, Stream};
use std::collections::BTreeMap;
use std::io::Write;
use tracing::debug;

/// Serializes an object table with a classic cross-reference section.
pub struct PdfWriter<W: Write> {
    writer: W,
    xref_positions: BTreeMap<ObjectId, u64>,
    current_position: u64,
}

impl<W: Write> PdfWriter<W> {
    pub fn new_with_writer(writer: W) -> Self {
        Self {
            writer,
            xref_positions: BTreeMap::new(),
            current_position: 0,
        }
    }

    pub fn write_table(&mut self, request: &WriteRequest<'_>) -> Result<()> {
        request.options.validate()?;
        if !request.objects.contains_key(&request.root) {
            return Err(PdfError::InvalidStructure(format!(
                "catalog {} is not in the object table",
                request.root
            )));
        }

        self.write_header(&request.options.pdf_version)?;
        for (id, object) in request.objects {
            self.write_object(*id, object, request.options)?;
        }

        let xref_position = self.current_position;
        self.write_xref()?;
        self.write_trailer(request.trailer, request.root, xref_position)?;
        self.writer.flush()?;

        debug!(
            objects = request.objects.len(),
            bytes = self.current_position,
            "wrote object table"
        );
        Ok(())
    }

    fn write_header(&mut self, version: &str) -> Result<()> {
        self.write_bytes(format!("%PDF-{version}\n").as_bytes())?;
        // Binary comment so transfer tools treat the file as binary
        self.write_bytes(&[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n'])?;
        Ok(())
    }

    fn write_object(&mut self, id: ObjectId, object: &Object, options: &WriteOptions) -> Result<()> {
        self.xref_positions.insert(id, self.current_position);

        let header = format!("{} {} obj\n", id.number(), id.generation());
        self.write_bytes(header.as_bytes())?;

        match object {
            Object::Stream(stream) if options.compress_streams => {
                let compressed = compress_stream(stream, options.compression_level)?;
                self.write_object_value(&Object::Stream(compressed))?;
            }
            _ => self.write_object_value(object)?,
        }

        self.write_bytes(b"\nendobj\n")?;
        Ok(())
    }

    fn write_object_value(&mut self, object: &Object) -> Result<()> {
        let mut buffer = Vec::new();
        serialize_value(object, &mut buffer);
        self.write_bytes(&buffer)
    }

    fn write_xref(&mut self) -> Result<()> {
        self.write_bytes(b"xref\n")?;

        let max_obj_num = self
            .xref_positions
            .keys()
            .map(|id| id.number())
            .max()
            .unwrap_or(0);

        let mut positions: BTreeMap<u32, (u16, u64)> = BTreeMap::new();
        for (id, position) in &self.xref_positions {
            positions.insert(id.number(), (id.generation(), *position));
        }
        let free: Vec<u32> = (1..=max_obj_num)
            .filter(|n| !positions.contains_key(n))
            .collect();

        self.write_bytes(format!("0 {}\n", max_obj_num + 1).as_bytes())?;

        // Free entries form a linked list headed by object 0
        let first_free = free.first().copied().unwrap_or(0);
        self.write_bytes(format!("{first_free:010} 65535 f \n").as_bytes())?;

        for obj_num in 1..=max_obj_num {
            let entry = match positions.get(&obj_num) {
                Some((generation, position)) => format!("{position:010} {generation:05} n \n"),
                None => {
                    let next = free.iter().find(|n| **n > obj_num).copied().unwrap_or(0);
                    format!("{next:010} 00001 f \n")
                }
            };
            self.write_bytes(entry.as_bytes())?;
        }

        Ok(())
    }

    fn write_trailer(&mut self, trailer: &Dictionary, root: ObjectId, xref_position: u64) -> Result<()> {
        let max_obj_num = self
            .xref_positions
            .keys()
            .map(|id| id.number())
            .max()
            .unwrap_or(0);

        let mut buffer = Vec::new();
        buffer.extend_from_slice(b"trailer\n<< /Size ");
        buffer.extend_from_slice((max_obj_num + 1).to_string().as_bytes());
        buffer.extend_from_slice(
            format!(" /Root {} {} R", root.number(), root.generation()).as_bytes(),
        );
        for (key, value) in trailer {
            if matches!(key.as_str(), "/Size" | "/Root" | "/Prev" | "/XRefStm") {
                continue;
            }
            buffer.push(b' ');
            buffer.extend_from_slice(key.escaped().as_bytes());
            buffer.push(b' ');
            serialize_value(value, &mut buffer);
        }
        buffer.extend_from_slice(b" >>\nstartxref\n");
        buffer.extend_from_slice(xref_position.to_string().as_bytes());
        buffer.extend_from_slice(b"\n%%EOF\n");

        self.write_bytes(&buffer)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.current_position += data.len() as u64;
        Ok(())
    }
}

/// Flate-compress a stream that has no filter yet; filtered or empty
/// streams are returned as they are.
fn compress_stream(stream: &Stream, level: u32) -> Result<Stream> {
    if stream.data().is_empty() || !stream.filters()?.is_empty() {
        return Ok(stream.clone());
    }
    let encoded = filters::encode_flate(stream.data(), level)?;
    let mut dictionary = stream.dictionary().clone();
    dictionary.insert(Name::known("/Filter"), Object::Name(Name::known("/FlateDecode")))?;
    Ok(Stream::new(dictionary, encoded))
}

impl Object {
    /// PDF syntax for this node. References are written as `n g R`
    /// without being resolved.
    pub fn unparse(&self) -> Vec<u8> {
        let mut out = Vec::new();
        serialize_value(self, &mut out);
        out
    }
}

pub(crate) fn serialize_value(object: &Object, out: &mut Vec<u8>) {
    match object {
        Object::Null => out.extend_from_slice(b"null"),
        Object::Boolean(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        Object::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
        Object::Real(r) => out.extend_from_slice(r.as_str().as_bytes()),
        Object::Name(n) => out.extend_from_slice(n.escaped().as_bytes()),
        Object::String(s) => serialize_string(s, out),
        Object::Operator(op) => out.extend_from_slice(op.as_str().as_bytes()),
        Object::Array(arr) => {
            out.push(b'[');
            for (i, obj) in arr.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                serialize_value(obj, out);
            }
            out.push(b']');
        }
        Object::Dictionary(dict) => serialize_dictionary(dict, out),
        Object::Stream(stream) => {
            serialize_dictionary(stream.dictionary(), out);
            out.extend_from_slice(b"\nstream\n");
            out.extend_from_slice(stream.data());
            out.extend_from_slice(b"\nendstream");
        }
        Object::InlineImage(image) => out.extend_from_slice(image.data()),
        Object::Reference(r) => {
            out.extend_from_slice(format!("{} {} R", r.id().number(), r.id().generation()).as_bytes())
        }
    }
}

fn serialize_dictionary(dict: &Dictionary, out: &mut Vec<u8>) {
    out.extend_from_slice(b"<<");
    for (key, value) in dict {
        out.push(b' ');
        out.extend_from_slice(key.escaped().as_bytes());
        out.push(b' ');
        serialize_value(value, out);
    }
    out.extend_from_slice(b" >>");
}

/// Literal form for mostly printable text, hex form otherwise.
fn serialize_string(string: &PdfString, out: &mut Vec<u8>) {
    let bytes = string.as_bytes();
    let binary = bytes
        .iter()
        .any(|b| !(0x20..=0x7E).contains(b) && !matches!(b, b'\n' | b'\r' | b'\t' | 0x08 | 0x0C));

    if binary {
        out.push(b'<');
        for byte in bytes {
            out.extend_from_slice(format!("{byte:02x}").as_bytes());
        }
        out.push(b'>');
        return;
    }

    out.push(b'(');
    for &byte in bytes {
        match byte {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(byte);
            }
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            0x08 => out.extend_from_slice(b"\\b"),
            0x0C => out.extend_from_slice(b"\\f"),
            _ => out.push(byte),
        }
    }
    out.push(b')');
}
