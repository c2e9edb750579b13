// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::chunk::{
    SerializedChunk, SerializedClassifierInstance, SerializedContainmentValue, SerializedPropertyValue,
    SerializedReferenceTarget, SerializedReferenceValue, UsedLanguage,
};
use crate::codecs::{ChunkCodec, CodecKind};
use ahash::AHashMap;
use byteorder::{ByteOrder, LittleEndian};
use nodeweave_structures::language::MetaPointer;
use nodeweave_structures::ModelError;

/// Index written in place of an absent string or meta-pointer
const NULL_INDEX: i32 = -1;

/// The compact table-based codec.
///
/// Every distinct string and every distinct meta-pointer of a chunk is stored once, in a table,
/// and referred to by index everywhere else. All numbers are little endian.
///
/// ```text
/// u8   layout version
/// u32  format version length, then its UTF-8 bytes
/// u32  string count, then per string: u32 length + UTF-8 bytes
/// u32  meta-pointer count, then per entry: i32 language, i32 version, i32 key (string indexes)
/// u32  language count, then per entry: i32 key, i32 version
/// u32  node count, then per node:
///      i32 id, i32 classifier (meta-pointer index), i32 parent
///      u32 property count,    per property:    i32 meta-pointer, i32 value
///      u32 containment count, per containment: i32 meta-pointer, u32 n, n * i32 child id
///      u32 reference count,   per reference:   i32 meta-pointer, u32 n, n * (i32 referred id, i32 resolve info)
///      u32 annotation count,  then i32 annotation ids
/// ```
///
/// An index of `-1` stands for null, which keeps a null property value apart from an empty string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinaryCodec;

impl BinaryCodec {
    pub const CURRENT_LAYOUT_VERSION: u8 = 1;

    pub const LAYOUT_VERSION_BYTE_COUNT: usize = 1;

    pub const COUNT_BYTE_COUNT: usize = 4; // 1 u32

    pub const INDEX_BYTE_COUNT: usize = 4; // 1 i32

    pub const META_POINTER_ENTRY_BYTE_COUNT: usize = 12; // 3 i32

    pub fn new() -> Self {
        BinaryCodec
    }
}

impl ChunkCodec for BinaryCodec {
    fn kind(&self) -> CodecKind {
        CodecKind::Binary
    }

    fn encode(&self, chunk: &SerializedChunk) -> Result<Vec<u8>, ModelError> {
        let tables = TableBuilder::from_chunk(chunk)?;
        let mut bytes = vec![0u8; tables.get_number_of_bytes_needed(chunk)];
        let mut writer = ByteWriter::new(&mut bytes);
        tables.write(chunk, &mut writer)?;
        writer.verify_filled()?;
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<SerializedChunk, ModelError> {
        let mut reader = ByteReader::new(bytes);

        let layout_version = reader.read_u8()?;
        if layout_version != Self::CURRENT_LAYOUT_VERSION {
            return Err(ModelError::MalformedBinary(format!(
                "Unsupported layout version {}, expected {}",
                layout_version,
                Self::CURRENT_LAYOUT_VERSION
            )));
        }
        let format_version = reader.read_string()?;

        let string_count = reader.read_count(Self::COUNT_BYTE_COUNT)?;
        let mut strings = Vec::with_capacity(string_count);
        for _ in 0..string_count {
            strings.push(reader.read_string()?);
        }
        let tables = DecodedTables {
            meta_pointers: Vec::new(),
            strings,
        };

        let meta_pointer_count = reader.read_count(Self::META_POINTER_ENTRY_BYTE_COUNT)?;
        let mut meta_pointers = Vec::with_capacity(meta_pointer_count);
        for _ in 0..meta_pointer_count {
            let language = tables.string(reader.read_i32()?, "meta-pointer language")?;
            let version = tables.string(reader.read_i32()?, "meta-pointer version")?;
            let key = tables.string(reader.read_i32()?, "meta-pointer key")?;
            meta_pointers.push(MetaPointer::new(language, version, key));
        }
        let tables = DecodedTables {
            meta_pointers,
            ..tables
        };

        let mut chunk = SerializedChunk::new(format_version);
        let language_count = reader.read_count(2 * Self::INDEX_BYTE_COUNT)?;
        for _ in 0..language_count {
            let key = tables.string(reader.read_i32()?, "language key")?;
            let version = tables.string(reader.read_i32()?, "language version")?;
            chunk.languages.push(UsedLanguage::new(key, version));
        }

        let node_count = reader.read_count(3 * Self::INDEX_BYTE_COUNT + 4 * Self::COUNT_BYTE_COUNT)?;
        for _ in 0..node_count {
            chunk.nodes.push(tables.read_node(&mut reader)?);
        }

        if reader.remaining() != 0 {
            return Err(ModelError::MalformedBinary(format!(
                "{} unexpected trailing bytes",
                reader.remaining()
            )));
        }
        Ok(chunk)
    }
}

//region Encoding

/// String and meta-pointer tables of one chunk, indexed in first-use order
#[derive(Debug, Default)]
struct TableBuilder {
    strings: Vec<String>,
    string_indexes: AHashMap<String, i32>,
    meta_pointers: Vec<[i32; 3]>,
    meta_pointer_indexes: AHashMap<MetaPointer, i32>,
    languages: Vec<[i32; 2]>,
    nodes: Vec<NodeRecord>,
}

/// A node with every string and meta-pointer replaced by its table index
#[derive(Debug, Default)]
struct NodeRecord {
    id: i32,
    classifier: i32,
    parent: i32,
    properties: Vec<[i32; 2]>,
    containments: Vec<(i32, Vec<i32>)>,
    references: Vec<(i32, Vec<[i32; 2]>)>,
    annotations: Vec<i32>,
}

impl TableBuilder {
    fn from_chunk(chunk: &SerializedChunk) -> Result<Self, ModelError> {
        let mut tables = TableBuilder::default();
        for language in &chunk.languages {
            let entry = [tables.index_string(&language.key)?, tables.index_string(&language.version)?];
            tables.languages.push(entry);
        }
        for node in &chunk.nodes {
            let record = tables.index_node(node)?;
            tables.nodes.push(record);
        }
        Ok(tables)
    }

    fn index_string(&mut self, value: &str) -> Result<i32, ModelError> {
        if let Some(index) = self.string_indexes.get(value) {
            return Ok(*index);
        }
        let index = next_table_index(self.strings.len(), "string")?;
        self.strings.push(value.to_string());
        self.string_indexes.insert(value.to_string(), index);
        Ok(index)
    }

    fn index_optional_string(&mut self, value: Option<&str>) -> Result<i32, ModelError> {
        match value {
            Some(value) => self.index_string(value),
            None => Ok(NULL_INDEX),
        }
    }

    fn index_meta_pointer(&mut self, meta_pointer: &MetaPointer) -> Result<i32, ModelError> {
        if let Some(index) = self.meta_pointer_indexes.get(meta_pointer) {
            return Ok(*index);
        }
        let entry = [
            self.index_string(&meta_pointer.language)?,
            self.index_string(&meta_pointer.version)?,
            self.index_string(&meta_pointer.key)?,
        ];
        let index = next_table_index(self.meta_pointers.len(), "meta-pointer")?;
        self.meta_pointers.push(entry);
        self.meta_pointer_indexes.insert(meta_pointer.clone(), index);
        Ok(index)
    }

    fn index_node(&mut self, node: &SerializedClassifierInstance) -> Result<NodeRecord, ModelError> {
        let mut record = NodeRecord {
            id: self.index_optional_string(node.id.as_deref())?,
            classifier: match &node.classifier {
                Some(classifier) => self.index_meta_pointer(classifier)?,
                None => NULL_INDEX,
            },
            parent: self.index_optional_string(node.parent.as_deref())?,
            ..Default::default()
        };
        for property in &node.properties {
            let entry = [
                self.index_meta_pointer(&property.property)?,
                self.index_optional_string(property.value.as_deref())?,
            ];
            record.properties.push(entry);
        }
        for containment in &node.containments {
            let meta_pointer = self.index_meta_pointer(&containment.containment)?;
            let children = containment
                .children
                .iter()
                .map(|c| self.index_string(c))
                .collect::<Result<Vec<_>, _>>()?;
            record.containments.push((meta_pointer, children));
        }
        for reference in &node.references {
            let meta_pointer = self.index_meta_pointer(&reference.reference)?;
            let mut targets = Vec::with_capacity(reference.targets.len());
            for target in &reference.targets {
                targets.push([
                    self.index_optional_string(target.reference.as_deref())?,
                    self.index_optional_string(target.resolve_info.as_deref())?,
                ]);
            }
            record.references.push((meta_pointer, targets));
        }
        record.annotations = node
            .annotations
            .iter()
            .map(|a| self.index_string(a))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(record)
    }

    fn get_number_of_bytes_needed(&self, chunk: &SerializedChunk) -> usize {
        let count = BinaryCodec::COUNT_BYTE_COUNT;
        let index = BinaryCodec::INDEX_BYTE_COUNT;

        let mut total = BinaryCodec::LAYOUT_VERSION_BYTE_COUNT + count + chunk.serialization_format_version.len();
        total += count + self.strings.iter().map(|s| count + s.len()).sum::<usize>();
        total += count + self.meta_pointers.len() * BinaryCodec::META_POINTER_ENTRY_BYTE_COUNT;
        total += count + self.languages.len() * 2 * index;
        total += count;
        for node in &self.nodes {
            total += 3 * index;
            total += count + node.properties.len() * 2 * index;
            total += count
                + node
                    .containments
                    .iter()
                    .map(|(_, children)| index + count + children.len() * index)
                    .sum::<usize>();
            total += count
                + node
                    .references
                    .iter()
                    .map(|(_, targets)| index + count + targets.len() * 2 * index)
                    .sum::<usize>();
            total += count + node.annotations.len() * index;
        }
        total
    }

    fn write(&self, chunk: &SerializedChunk, writer: &mut ByteWriter<'_>) -> Result<(), ModelError> {
        writer.write_u8(BinaryCodec::CURRENT_LAYOUT_VERSION)?;
        writer.write_string(&chunk.serialization_format_version)?;

        writer.write_count(self.strings.len())?;
        for string in &self.strings {
            writer.write_string(string)?;
        }

        writer.write_count(self.meta_pointers.len())?;
        for entry in &self.meta_pointers {
            for index in entry {
                writer.write_i32(*index)?;
            }
        }

        writer.write_count(self.languages.len())?;
        for [key, version] in &self.languages {
            writer.write_i32(*key)?;
            writer.write_i32(*version)?;
        }

        writer.write_count(self.nodes.len())?;
        for node in &self.nodes {
            writer.write_i32(node.id)?;
            writer.write_i32(node.classifier)?;
            writer.write_i32(node.parent)?;

            writer.write_count(node.properties.len())?;
            for [property, value] in &node.properties {
                writer.write_i32(*property)?;
                writer.write_i32(*value)?;
            }

            writer.write_count(node.containments.len())?;
            for (containment, children) in &node.containments {
                writer.write_i32(*containment)?;
                writer.write_count(children.len())?;
                for child in children {
                    writer.write_i32(*child)?;
                }
            }

            writer.write_count(node.references.len())?;
            for (reference, targets) in &node.references {
                writer.write_i32(*reference)?;
                writer.write_count(targets.len())?;
                for [referred, resolve_info] in targets {
                    writer.write_i32(*referred)?;
                    writer.write_i32(*resolve_info)?;
                }
            }

            writer.write_count(node.annotations.len())?;
            for annotation in &node.annotations {
                writer.write_i32(*annotation)?;
            }
        }
        Ok(())
    }
}

/// Writes into a slice sized up front
struct ByteWriter<'a> {
    bytes: &'a mut [u8],
    cursor: usize,
}

impl<'a> ByteWriter<'a> {
    fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    fn take(&mut self, number_bytes: usize) -> Result<&mut [u8], ModelError> {
        let end = self.cursor + number_bytes;
        if end > self.bytes.len() {
            return Err(ModelError::MalformedBinary(format!(
                "Write of {} bytes at offset {} exceeds the allocated {} bytes",
                number_bytes,
                self.cursor,
                self.bytes.len()
            )));
        }
        let slice = &mut self.bytes[self.cursor..end];
        self.cursor = end;
        Ok(slice)
    }

    fn write_u8(&mut self, value: u8) -> Result<(), ModelError> {
        self.take(1)?[0] = value;
        Ok(())
    }

    fn write_count(&mut self, count: usize) -> Result<(), ModelError> {
        let count = u32::try_from(count)
            .map_err(|_| ModelError::MalformedBinary(format!("Count {} does not fit in a u32", count)))?;
        LittleEndian::write_u32(self.take(4)?, count);
        Ok(())
    }

    fn write_i32(&mut self, value: i32) -> Result<(), ModelError> {
        LittleEndian::write_i32(self.take(4)?, value);
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> Result<(), ModelError> {
        self.write_count(value.len())?;
        self.take(value.len())?.copy_from_slice(value.as_bytes());
        Ok(())
    }

    fn verify_filled(&self) -> Result<(), ModelError> {
        if self.cursor != self.bytes.len() {
            return Err(ModelError::MalformedBinary(format!(
                "Wrote {} bytes but allocated {}",
                self.cursor,
                self.bytes.len()
            )));
        }
        Ok(())
    }
}

/// The index the next entry of a table will get. Tables are addressed by i32, with -1 as null.
fn next_table_index(len: usize, what: &str) -> Result<i32, ModelError> {
    i32::try_from(len)
        .map_err(|_| ModelError::MalformedBinary(format!("Too many {} entries for an i32 index: {}", what, len)))
}

//endregion

//region Decoding

struct ByteReader<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.cursor
    }

    fn take(&mut self, number_bytes: usize) -> Result<&'a [u8], ModelError> {
        if number_bytes > self.remaining() {
            return Err(ModelError::MalformedBinary(format!(
                "Unexpected end of data: needed {} bytes at offset {}, {} left",
                number_bytes,
                self.cursor,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.cursor..self.cursor + number_bytes];
        self.cursor += number_bytes;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, ModelError> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32, ModelError> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    fn read_i32(&mut self) -> Result<i32, ModelError> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    /// Reads a count, rejecting counts that could not fit in the bytes left given the smallest
    /// possible size of one entry
    fn read_count(&mut self, min_entry_bytes: usize) -> Result<usize, ModelError> {
        let count = self.read_u32()? as usize;
        if count.saturating_mul(min_entry_bytes) > self.remaining() {
            return Err(ModelError::MalformedBinary(format!(
                "Count {} at offset {} exceeds the {} bytes left",
                count,
                self.cursor - 4,
                self.remaining()
            )));
        }
        Ok(count)
    }

    fn read_string(&mut self) -> Result<String, ModelError> {
        let length = self.read_count(1)?;
        let raw = self.take(length)?;
        String::from_utf8(raw.to_vec()).map_err(|e| ModelError::MalformedBinary(format!("Invalid UTF-8 string: {}", e)))
    }
}

struct DecodedTables {
    strings: Vec<String>,
    meta_pointers: Vec<MetaPointer>,
}

impl DecodedTables {
    fn optional_string(&self, index: i32) -> Result<Option<String>, ModelError> {
        if index == NULL_INDEX {
            return Ok(None);
        }
        usize::try_from(index)
            .ok()
            .and_then(|i| self.strings.get(i))
            .map(|s| Some(s.clone()))
            .ok_or(ModelError::IndexOutOfRange {
                table: "string",
                index: index as i64,
                len: self.strings.len(),
            })
    }

    fn string(&self, index: i32, what: &str) -> Result<String, ModelError> {
        self.optional_string(index)?
            .ok_or_else(|| ModelError::MalformedBinary(format!("Null index where a {} is required", what)))
    }

    fn optional_meta_pointer(&self, index: i32) -> Result<Option<MetaPointer>, ModelError> {
        if index == NULL_INDEX {
            return Ok(None);
        }
        usize::try_from(index)
            .ok()
            .and_then(|i| self.meta_pointers.get(i))
            .map(|m| Some(m.clone()))
            .ok_or(ModelError::IndexOutOfRange {
                table: "meta-pointer",
                index: index as i64,
                len: self.meta_pointers.len(),
            })
    }

    fn meta_pointer(&self, index: i32, what: &str) -> Result<MetaPointer, ModelError> {
        self.optional_meta_pointer(index)?
            .ok_or_else(|| ModelError::MalformedBinary(format!("Null index where a {} is required", what)))
    }

    fn read_node(&self, reader: &mut ByteReader<'_>) -> Result<SerializedClassifierInstance, ModelError> {
        let index = BinaryCodec::INDEX_BYTE_COUNT;
        let count = BinaryCodec::COUNT_BYTE_COUNT;

        let mut node = SerializedClassifierInstance {
            id: self.optional_string(reader.read_i32()?)?,
            classifier: self.optional_meta_pointer(reader.read_i32()?)?,
            parent: self.optional_string(reader.read_i32()?)?,
            ..Default::default()
        };

        for _ in 0..reader.read_count(2 * index)? {
            node.properties.push(SerializedPropertyValue {
                property: self.meta_pointer(reader.read_i32()?, "property")?,
                value: self.optional_string(reader.read_i32()?)?,
            });
        }

        for _ in 0..reader.read_count(index + count)? {
            let containment = self.meta_pointer(reader.read_i32()?, "containment")?;
            let child_count = reader.read_count(index)?;
            let mut children = Vec::with_capacity(child_count);
            for _ in 0..child_count {
                children.push(self.string(reader.read_i32()?, "child id")?);
            }
            node.containments.push(SerializedContainmentValue { containment, children });
        }

        for _ in 0..reader.read_count(index + count)? {
            let reference = self.meta_pointer(reader.read_i32()?, "reference")?;
            let target_count = reader.read_count(2 * index)?;
            let mut targets = Vec::with_capacity(target_count);
            for _ in 0..target_count {
                targets.push(SerializedReferenceTarget {
                    reference: self.optional_string(reader.read_i32()?)?,
                    resolve_info: self.optional_string(reader.read_i32()?)?,
                });
            }
            node.references.push(SerializedReferenceValue { reference, targets });
        }

        for _ in 0..reader.read_count(index)? {
            node.annotations.push(self.string(reader.read_i32()?, "annotation id")?);
        }
        Ok(node)
    }
}

//endregion

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_index_limit() {
        assert_eq!(next_table_index(0, "string").unwrap(), 0);
        assert_eq!(next_table_index(i32::MAX as usize, "string").unwrap(), i32::MAX);
        let err = next_table_index(i32::MAX as usize + 1, "meta-pointer").unwrap_err();
        assert!(matches!(err, ModelError::MalformedBinary(message) if message.contains("meta-pointer")));
    }

    fn mp(key: &str) -> MetaPointer {
        MetaPointer::new("mylanguage", "1", key)
    }

    fn sample_chunk() -> SerializedChunk {
        let mut chunk = SerializedChunk::default();
        chunk.add_language(UsedLanguage::new("mylanguage", "1"));

        let mut root = SerializedClassifierInstance::new(Some("root".into()), mp("Folder"));
        root.add_property_value(mp("name"), Some("".into()));
        root.add_property_value(mp("description"), None);
        root.add_containment_value(mp("entries"), vec!["leaf".into()]);
        root.annotations.push("note".into());
        chunk.add_instance(root);

        let mut leaf = SerializedClassifierInstance::new(Some("leaf".into()), mp("Folder")).with_parent("root");
        leaf.add_property_value(mp("name"), Some("leaf".into()));
        leaf.add_reference_value(
            mp("link"),
            vec![
                SerializedReferenceTarget {
                    reference: Some("root".into()),
                    resolve_info: None,
                },
                SerializedReferenceTarget {
                    reference: None,
                    resolve_info: Some("elsewhere".into()),
                },
            ],
        );
        chunk.add_instance(leaf);

        chunk.add_instance(SerializedClassifierInstance::new(Some("note".into()), mp("Note")).with_parent("root"));
        chunk
    }

    /// Reads the string and meta-pointer table sizes straight from the header
    fn table_counts(bytes: &[u8]) -> (u32, u32) {
        let mut reader = ByteReader::new(bytes);
        reader.read_u8().unwrap();
        reader.read_string().unwrap();
        let string_count = reader.read_u32().unwrap();
        for _ in 0..string_count {
            reader.read_string().unwrap();
        }
        (string_count, reader.read_u32().unwrap())
    }

    #[test]
    fn test_encode_decode_preserves_chunk() {
        let chunk = sample_chunk();
        let bytes = BinaryCodec::new().encode(&chunk).unwrap();
        assert_eq!(bytes[0], BinaryCodec::CURRENT_LAYOUT_VERSION);
        assert_eq!(BinaryCodec::new().decode(&bytes).unwrap(), chunk);
    }

    #[test]
    fn test_tables_store_each_value_once() {
        let bytes = BinaryCodec::new().encode(&sample_chunk()).unwrap();
        let (strings, meta_pointers) = table_counts(&bytes);
        // mylanguage 1 root Folder "" name description entries leaf note link elsewhere Note
        assert_eq!(strings, 13);
        // Folder name description entries link Note
        assert_eq!(meta_pointers, 6);
    }

    #[test]
    fn test_null_and_empty_string_stay_distinct() {
        let decoded = BinaryCodec::new()
            .decode(&BinaryCodec::new().encode(&sample_chunk()).unwrap())
            .unwrap();
        let root = decoded.instance_by_id("root").unwrap();
        assert_eq!(root.property_value(&mp("name")), Some(Some("")));
        assert_eq!(root.property_value(&mp("description")), Some(None));
    }

    #[test]
    fn test_rejects_truncated_and_trailing_data() {
        let bytes = BinaryCodec::new().encode(&sample_chunk()).unwrap();
        for cut in [0, 1, 5, bytes.len() / 2, bytes.len() - 1] {
            assert!(
                matches!(BinaryCodec::new().decode(&bytes[..cut]), Err(ModelError::MalformedBinary(_))),
                "cut at {}",
                cut
            );
        }
        let mut extended = bytes.clone();
        extended.push(0);
        assert!(matches!(BinaryCodec::new().decode(&extended), Err(ModelError::MalformedBinary(_))));

        let mut wrong_layout = bytes;
        wrong_layout[0] = 9;
        assert!(matches!(BinaryCodec::new().decode(&wrong_layout), Err(ModelError::MalformedBinary(_))));
    }

    #[test]
    fn test_out_of_range_index() {
        let mut chunk = SerializedChunk::default();
        chunk.add_instance(SerializedClassifierInstance::new(Some("a".into()), mp("A")));
        let mut bytes = BinaryCodec::new().encode(&chunk).unwrap();

        // the id index of the only node sits right after the node count
        let node_id_offset = bytes.len() - 4 * 4 - 3 * 4;
        LittleEndian::write_i32(&mut bytes[node_id_offset..node_id_offset + 4], 42);
        assert_eq!(
            BinaryCodec::new().decode(&bytes).unwrap_err(),
            ModelError::IndexOutOfRange {
                table: "string",
                index: 42,
                len: 4
            }
        );

        // a classifier index of -1 is a null classifier, anything below is out of range
        LittleEndian::write_i32(&mut bytes[node_id_offset..node_id_offset + 4], 0);
        LittleEndian::write_i32(&mut bytes[node_id_offset + 4..node_id_offset + 8], -7);
        assert!(matches!(
            BinaryCodec::new().decode(&bytes),
            Err(ModelError::IndexOutOfRange {
                table: "meta-pointer",
                ..
            })
        ));
    }
}
