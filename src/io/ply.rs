//! PLY (Polygon File Format) loader.
//!
//! PLY files carry their own schema: a textual header declares an ordered
//! list of elements, each with an ordered list of typed properties, followed
//! by the body in one of three encodings (ASCII, binary big endian, binary
//! little endian). The loader materializes every property into a typed
//! column; records are never built. Downstream code opens per-column views
//! and assembles its own point records.
//!
//! Format reference: the PLY 1.0 specification, restricted to the eight
//! scalar type names (`char`, `uchar`, `short`, `ushort`, `int`, `uint`,
//! `float`, `double`) and the `list` property form.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use thiserror::Error;

use crate::io::text;

/// Errors that can occur while loading or inspecting a PLY file.
///
/// Errors raised during the header or the ASCII body carry the 1-based line
/// number counted from the start of the file; errors raised in a binary body
/// are marked as such instead, since there are no line boundaries.
#[derive(Debug, Error)]
pub enum PlyError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {message}")]
    Syntax { line: u64, message: String },

    #[error("binary file part: {message}")]
    Binary { message: String },

    #[error("PLY contains no element \"{0}\"")]
    NoSuchElement(String),

    #[error("PLY element \"{element}\" contains no property \"{property}\"")]
    NoSuchProperty { element: String, property: String },

    #[error(
        "PLY element \"{element}\" property \"{property}\" accessed as \
         {requested} but its type is {stored}"
    )]
    TypeMismatch {
        element: String,
        property: String,
        requested: &'static str,
        stored: &'static str,
    },
}

/// Body encoding, selected by the `format` header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlyFormat {
    Ascii,
    BinaryBigEndian,
    BinaryLittleEndian,
}

impl PlyFormat {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "ascii" => Some(PlyFormat::Ascii),
            "binary_big_endian" => Some(PlyFormat::BinaryBigEndian),
            "binary_little_endian" => Some(PlyFormat::BinaryLittleEndian),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PlyFormat::Ascii => "ascii",
            PlyFormat::BinaryBigEndian => "binary_big_endian",
            PlyFormat::BinaryLittleEndian => "binary_little_endian",
        }
    }
}

/// Byte order of a binary body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// The eight PLY scalar types. The ordinal (0..=7) is stable and matches the
/// declaration order of the PLY type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Float,
    Double,
}

impl ScalarType {
    pub const ALL: [ScalarType; 8] = [
        ScalarType::Char,
        ScalarType::UChar,
        ScalarType::Short,
        ScalarType::UShort,
        ScalarType::Int,
        ScalarType::UInt,
        ScalarType::Float,
        ScalarType::Double,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "char" => Some(ScalarType::Char),
            "uchar" => Some(ScalarType::UChar),
            "short" => Some(ScalarType::Short),
            "ushort" => Some(ScalarType::UShort),
            "int" => Some(ScalarType::Int),
            "uint" => Some(ScalarType::UInt),
            "float" => Some(ScalarType::Float),
            "double" => Some(ScalarType::Double),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Char => "char",
            ScalarType::UChar => "uchar",
            ScalarType::Short => "short",
            ScalarType::UShort => "ushort",
            ScalarType::Int => "int",
            ScalarType::UInt => "uint",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
        }
    }

    pub fn list_name(self) -> &'static str {
        match self {
            ScalarType::Char => "list of char",
            ScalarType::UChar => "list of uchar",
            ScalarType::Short => "list of short",
            ScalarType::UShort => "list of ushort",
            ScalarType::Int => "list of int",
            ScalarType::UInt => "list of uint",
            ScalarType::Float => "list of float",
            ScalarType::Double => "list of double",
        }
    }

    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Encoded width in a binary body, in bytes.
    pub fn size(self) -> usize {
        match self {
            ScalarType::Char | ScalarType::UChar => 1,
            ScalarType::Short | ScalarType::UShort => 2,
            ScalarType::Int | ScalarType::UInt | ScalarType::Float => 4,
            ScalarType::Double => 8,
        }
    }
}

/// A Rust scalar that backs one of the eight PLY types.
pub trait PlyScalar: Copy + Sized {
    const TYPE: ScalarType;

    /// Read one value in the given byte order.
    fn read_binary<R: Read>(reader: &mut R, endian: Endian) -> io::Result<Self>;

    /// Parse one ASCII token.
    fn parse_token(token: &str) -> Option<Self>;

    /// Interpret this value as a list length.
    fn list_len(self) -> Result<usize, &'static str>;

    /// View a column as a slice of this type, if the types match.
    fn scalar_slice(values: &PropertyValues) -> Option<&[Self]>;

    /// View a list column as rows of this type, if the types match.
    fn list_slice(values: &PropertyValues) -> Option<&[Vec<Self>]>;
}

fn signed_list_len(len: i64) -> Result<usize, &'static str> {
    if len < 0 {
        Err("list property length is negative")
    } else {
        Ok(len as usize)
    }
}

fn float_list_len(len: f64) -> Result<usize, &'static str> {
    if len != len.floor() {
        Err("list property length is not integer")
    } else if len < 0.0 {
        Err("list property length is negative")
    } else {
        Ok(len as usize)
    }
}

// One impl per scalar type; the only genuine differences are the byteorder
// read call and the list-length conversion, so a macro keeps the eight impls
// in one place.
macro_rules! impl_ply_scalar {
    (
        $ty:ty, $variant:ident, $list_variant:ident,
        read: |$reader:ident, $endian:ident| $read:expr,
        len: |$len:ident| $to_len:expr
    ) => {
        impl PlyScalar for $ty {
            const TYPE: ScalarType = ScalarType::$variant;

            fn read_binary<R: Read>($reader: &mut R, $endian: Endian) -> io::Result<Self> {
                $read
            }

            fn parse_token(token: &str) -> Option<Self> {
                text::parse_number(token)
            }

            fn list_len(self) -> Result<usize, &'static str> {
                let $len = self;
                $to_len
            }

            fn scalar_slice(values: &PropertyValues) -> Option<&[Self]> {
                match values {
                    PropertyValues::$variant(column) => Some(column),
                    _ => None,
                }
            }

            fn list_slice(values: &PropertyValues) -> Option<&[Vec<Self>]> {
                match values {
                    PropertyValues::$list_variant(column) => Some(column),
                    _ => None,
                }
            }
        }
    };
}

impl_ply_scalar!(i8, Char, CharList,
    read: |reader, _endian| reader.read_i8(),
    len: |len| signed_list_len(len as i64));
impl_ply_scalar!(u8, UChar, UCharList,
    read: |reader, _endian| reader.read_u8(),
    len: |len| Ok(len as usize));
impl_ply_scalar!(i16, Short, ShortList,
    read: |reader, endian| match endian {
        Endian::Big => reader.read_i16::<BigEndian>(),
        Endian::Little => reader.read_i16::<LittleEndian>(),
    },
    len: |len| signed_list_len(len as i64));
impl_ply_scalar!(u16, UShort, UShortList,
    read: |reader, endian| match endian {
        Endian::Big => reader.read_u16::<BigEndian>(),
        Endian::Little => reader.read_u16::<LittleEndian>(),
    },
    len: |len| Ok(len as usize));
impl_ply_scalar!(i32, Int, IntList,
    read: |reader, endian| match endian {
        Endian::Big => reader.read_i32::<BigEndian>(),
        Endian::Little => reader.read_i32::<LittleEndian>(),
    },
    len: |len| signed_list_len(len as i64));
impl_ply_scalar!(u32, UInt, UIntList,
    read: |reader, endian| match endian {
        Endian::Big => reader.read_u32::<BigEndian>(),
        Endian::Little => reader.read_u32::<LittleEndian>(),
    },
    len: |len| Ok(len as usize));
impl_ply_scalar!(f32, Float, FloatList,
    read: |reader, endian| match endian {
        Endian::Big => reader.read_f32::<BigEndian>(),
        Endian::Little => reader.read_f32::<LittleEndian>(),
    },
    len: |len| float_list_len(len as f64));
impl_ply_scalar!(f64, Double, DoubleList,
    read: |reader, endian| match endian {
        Endian::Big => reader.read_f64::<BigEndian>(),
        Endian::Little => reader.read_f64::<LittleEndian>(),
    },
    len: |len| float_list_len(len));

/// One materialized column: a tagged union over the eight scalar types in
/// both shapes (flat column, or one variable-length row per record).
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValues {
    Char(Vec<i8>),
    UChar(Vec<u8>),
    Short(Vec<i16>),
    UShort(Vec<u16>),
    Int(Vec<i32>),
    UInt(Vec<u32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    CharList(Vec<Vec<i8>>),
    UCharList(Vec<Vec<u8>>),
    ShortList(Vec<Vec<i16>>),
    UShortList(Vec<Vec<u16>>),
    IntList(Vec<Vec<i32>>),
    UIntList(Vec<Vec<u32>>),
    FloatList(Vec<Vec<f32>>),
    DoubleList(Vec<Vec<f64>>),
}

impl PropertyValues {
    /// Constructor table for scalar columns, indexed by type.
    fn new_scalar(ty: ScalarType, count: usize) -> Self {
        match ty {
            ScalarType::Char => PropertyValues::Char(Vec::with_capacity(count)),
            ScalarType::UChar => PropertyValues::UChar(Vec::with_capacity(count)),
            ScalarType::Short => PropertyValues::Short(Vec::with_capacity(count)),
            ScalarType::UShort => PropertyValues::UShort(Vec::with_capacity(count)),
            ScalarType::Int => PropertyValues::Int(Vec::with_capacity(count)),
            ScalarType::UInt => PropertyValues::UInt(Vec::with_capacity(count)),
            ScalarType::Float => PropertyValues::Float(Vec::with_capacity(count)),
            ScalarType::Double => PropertyValues::Double(Vec::with_capacity(count)),
        }
    }

    /// Constructor table for list columns, indexed by element type.
    fn new_list(ty: ScalarType, count: usize) -> Self {
        match ty {
            ScalarType::Char => PropertyValues::CharList(Vec::with_capacity(count)),
            ScalarType::UChar => PropertyValues::UCharList(Vec::with_capacity(count)),
            ScalarType::Short => PropertyValues::ShortList(Vec::with_capacity(count)),
            ScalarType::UShort => PropertyValues::UShortList(Vec::with_capacity(count)),
            ScalarType::Int => PropertyValues::IntList(Vec::with_capacity(count)),
            ScalarType::UInt => PropertyValues::UIntList(Vec::with_capacity(count)),
            ScalarType::Float => PropertyValues::FloatList(Vec::with_capacity(count)),
            ScalarType::Double => PropertyValues::DoubleList(Vec::with_capacity(count)),
        }
    }

    pub fn is_list(&self) -> bool {
        !matches!(
            self,
            PropertyValues::Char(_)
                | PropertyValues::UChar(_)
                | PropertyValues::Short(_)
                | PropertyValues::UShort(_)
                | PropertyValues::Int(_)
                | PropertyValues::UInt(_)
                | PropertyValues::Float(_)
                | PropertyValues::Double(_)
        )
    }

    /// PLY name of the stored type, e.g. `int` or `list of int`.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValues::Char(_) => ScalarType::Char.name(),
            PropertyValues::UChar(_) => ScalarType::UChar.name(),
            PropertyValues::Short(_) => ScalarType::Short.name(),
            PropertyValues::UShort(_) => ScalarType::UShort.name(),
            PropertyValues::Int(_) => ScalarType::Int.name(),
            PropertyValues::UInt(_) => ScalarType::UInt.name(),
            PropertyValues::Float(_) => ScalarType::Float.name(),
            PropertyValues::Double(_) => ScalarType::Double.name(),
            PropertyValues::CharList(_) => ScalarType::Char.list_name(),
            PropertyValues::UCharList(_) => ScalarType::UChar.list_name(),
            PropertyValues::ShortList(_) => ScalarType::Short.list_name(),
            PropertyValues::UShortList(_) => ScalarType::UShort.list_name(),
            PropertyValues::IntList(_) => ScalarType::Int.list_name(),
            PropertyValues::UIntList(_) => ScalarType::UInt.list_name(),
            PropertyValues::FloatList(_) => ScalarType::Float.list_name(),
            PropertyValues::DoubleList(_) => ScalarType::Double.list_name(),
        }
    }

    /// Number of materialized records.
    pub fn len(&self) -> usize {
        match self {
            PropertyValues::Char(v) => v.len(),
            PropertyValues::UChar(v) => v.len(),
            PropertyValues::Short(v) => v.len(),
            PropertyValues::UShort(v) => v.len(),
            PropertyValues::Int(v) => v.len(),
            PropertyValues::UInt(v) => v.len(),
            PropertyValues::Float(v) => v.len(),
            PropertyValues::Double(v) => v.len(),
            PropertyValues::CharList(v) => v.len(),
            PropertyValues::UCharList(v) => v.len(),
            PropertyValues::ShortList(v) => v.len(),
            PropertyValues::UShortList(v) => v.len(),
            PropertyValues::IntList(v) => v.len(),
            PropertyValues::UIntList(v) => v.len(),
            PropertyValues::FloatList(v) => v.len(),
            PropertyValues::DoubleList(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named typed column within an element.
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    count_type: Option<ScalarType>,
    values: PropertyValues,
}

impl Property {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The count type of a list property, `None` for scalars.
    pub fn count_type(&self) -> Option<ScalarType> {
        self.count_type
    }

    pub fn values(&self) -> &PropertyValues {
        &self.values
    }

    pub fn is_list(&self) -> bool {
        self.values.is_list()
    }

    pub fn type_name(&self) -> &'static str {
        self.values.type_name()
    }
}

/// A named, fixed-length collection of records sharing one schema.
#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    count: usize,
    properties: Vec<Property>,
}

impl Element {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared record count. Every property column has this length after a
    /// successful load.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Look up a property by name. When the header declared duplicate names
    /// the first declaration wins.
    pub fn property(&self, name: &str) -> Result<&Property, PlyError> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| PlyError::NoSuchProperty {
                element: self.name.clone(),
                property: name.to_owned(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }

    pub fn has_duplicate_property_names(&self) -> bool {
        let mut names: Vec<&str> = self.properties.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        names.windows(2).any(|pair| pair[0] == pair[1])
    }

    /// Typed view of a scalar column. Fails with a type mismatch when the
    /// stored type differs from `T` — it never hands out junk.
    pub fn scalar<T: PlyScalar>(&self, name: &str) -> Result<&[T], PlyError> {
        let property = self.property(name)?;
        T::scalar_slice(&property.values).ok_or_else(|| PlyError::TypeMismatch {
            element: self.name.clone(),
            property: property.name.clone(),
            requested: T::TYPE.name(),
            stored: property.type_name(),
        })
    }

    /// Typed view of a list column, one sub-slice per record.
    pub fn list<T: PlyScalar>(&self, name: &str) -> Result<&[Vec<T>], PlyError> {
        let property = self.property(name)?;
        T::list_slice(&property.values).ok_or_else(|| PlyError::TypeMismatch {
            element: self.name.clone(),
            property: property.name.clone(),
            requested: T::TYPE.list_name(),
            stored: property.type_name(),
        })
    }
}

/// A fully loaded PLY file: format, comments and materialized elements.
#[derive(Debug, Clone)]
pub struct PlyFile {
    format: PlyFormat,
    comments: Vec<String>,
    elements: Vec<Element>,
}

impl PlyFile {
    /// Load a PLY file from disk.
    pub fn load(path: &Path) -> Result<Self, PlyError> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Load a PLY file from any buffered reader.
    pub fn read(reader: impl BufRead) -> Result<Self, PlyError> {
        Loader::new(reader).run()
    }

    pub fn format(&self) -> PlyFormat {
        self.format
    }

    /// Header comments, in declaration order.
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Look up an element by name. When the header declared duplicate names
    /// the first declaration wins.
    pub fn element(&self, name: &str) -> Result<&Element, PlyError> {
        self.elements
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| PlyError::NoSuchElement(name.to_owned()))
    }

    pub fn contains_element(&self, name: &str) -> bool {
        self.elements.iter().any(|e| e.name == name)
    }

    /// `false` when either the element or the property is absent.
    pub fn contains_property(&self, element: &str, property: &str) -> bool {
        self.elements
            .iter()
            .find(|e| e.name == element)
            .map(|e| e.contains(property))
            .unwrap_or(false)
    }

    pub fn has_duplicate_element_names(&self) -> bool {
        let mut names: Vec<&str> = self.elements.iter().map(|e| e.name.as_str()).collect();
        names.sort_unstable();
        names.windows(2).any(|pair| pair[0] == pair[1])
    }
}

struct Loader<R> {
    reader: R,
    line_number: u64,
}

impl<R: BufRead> Loader<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
        }
    }

    fn syntax(&self, message: impl Into<String>) -> PlyError {
        PlyError::Syntax {
            line: self.line_number,
            message: message.into(),
        }
    }

    /// Read the next line, without its terminator. `None` at end of input.
    fn next_line(&mut self) -> Result<Option<String>, PlyError> {
        let mut line = String::new();
        self.line_number += 1;
        let read = self.reader.read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
        }
        Ok(Some(line))
    }

    fn require_line(&mut self) -> Result<String, PlyError> {
        self.next_line()?
            .ok_or_else(|| self.syntax("unexpected end of input"))
    }

    fn run(mut self) -> Result<PlyFile, PlyError> {
        // Magic line; leading empty lines are tolerated.
        loop {
            let line = self.require_line()?;
            let trimmed = text::trim(&line);
            if trimmed.is_empty() {
                continue;
            }
            if trimmed != "ply" {
                return Err(self.syntax("invalid first line"));
            }
            break;
        }

        let format = self.parse_format_line()?;
        let mut comments = Vec::new();
        let mut elements = Vec::new();

        loop {
            let line = self.require_line()?;
            let [keyword, spec] = text::split_front::<2>(text::trim(&line));
            match keyword {
                "comment" => comments.push(spec.to_owned()),
                "element" => self.add_element(&mut elements, spec)?,
                "property" => self.add_property(&mut elements, spec)?,
                "end_header" => break,
                _ => {
                    return Err(self.syntax(format!("invalid header entry \"{keyword}\"")));
                }
            }
        }

        match format {
            PlyFormat::Ascii => self.load_ascii(&mut elements)?,
            PlyFormat::BinaryBigEndian => self.load_binary(&mut elements, Endian::Big)?,
            PlyFormat::BinaryLittleEndian => self.load_binary(&mut elements, Endian::Little)?,
        }

        Ok(PlyFile {
            format,
            comments,
            elements,
        })
    }

    fn parse_format_line(&mut self) -> Result<PlyFormat, PlyError> {
        let line = self.require_line()?;
        let [keyword, kind, version] = text::split_front::<3>(text::trim(&line));
        if keyword != "format" {
            return Err(self.syntax("invalid format line"));
        }
        if version != "1.0" {
            return Err(self.syntax("unsupported format version"));
        }
        PlyFormat::from_name(kind).ok_or_else(|| self.syntax("invalid format"))
    }

    fn add_element(&self, elements: &mut Vec<Element>, spec: &str) -> Result<(), PlyError> {
        // The count is the last token; everything before it is the name.
        let [name, count] = text::split_back::<2>(spec);
        let count: usize = text::parse_number(count)
            .ok_or_else(|| self.syntax(format!("can not convert \"{count}\" to element count")))?;
        elements.push(Element {
            name: name.to_owned(),
            count,
            properties: Vec::new(),
        });
        Ok(())
    }

    fn add_property(&self, elements: &mut [Element], spec: &str) -> Result<(), PlyError> {
        let element = elements
            .last_mut()
            .ok_or_else(|| self.syntax("property without previous element"))?;
        let count = element.count;

        let [kind, rest] = text::split_front::<2>(spec);
        let property = if kind == "list" {
            let [count_name, item_name, name] = text::split_front::<3>(rest);
            let count_type = ScalarType::from_name(count_name)
                .ok_or_else(|| self.syntax("invalid property list count type"))?;
            let item_type = ScalarType::from_name(item_name)
                .ok_or_else(|| self.syntax("invalid property list data type"))?;
            if name.is_empty() {
                return Err(self.syntax("no list property name defined"));
            }
            Property {
                name: name.to_owned(),
                count_type: Some(count_type),
                values: PropertyValues::new_list(item_type, count),
            }
        } else {
            let data_type = ScalarType::from_name(kind)
                .ok_or_else(|| self.syntax("invalid property data type"))?;
            if rest.is_empty() {
                return Err(self.syntax("no property name defined"));
            }
            Property {
                name: rest.to_owned(),
                count_type: None,
                values: PropertyValues::new_scalar(data_type, count),
            }
        };
        element.properties.push(property);
        Ok(())
    }

    fn load_ascii(&mut self, elements: &mut [Element]) -> Result<(), PlyError> {
        for element in elements.iter_mut() {
            for _ in 0..element.count {
                let line = self.require_line()?;
                let mut cursor = text::trim(&line);
                for property in element.properties.iter_mut() {
                    load_ascii_value(&mut property.values, property.count_type, &mut cursor)
                        .map_err(|message| PlyError::Syntax {
                            line: self.line_number,
                            message,
                        })?;
                }
                if !cursor.is_empty() {
                    return Err(self.syntax("data line contains more values than specified"));
                }
            }
        }
        Ok(())
    }

    fn load_binary(&mut self, elements: &mut [Element], endian: Endian) -> Result<(), PlyError> {
        let reader = &mut self.reader;
        for element in elements.iter_mut() {
            for _ in 0..element.count {
                for property in element.properties.iter_mut() {
                    load_binary_value(&mut property.values, property.count_type, reader, endian)?;
                }
            }
        }
        Ok(())
    }
}

/// Consume one ASCII token and parse it as `T`.
fn take_token<T: PlyScalar>(cursor: &mut &str) -> Result<T, String> {
    let [token, rest] = text::split_front::<2>(*cursor);
    let value = T::parse_token(token)
        .ok_or_else(|| format!("can not convert \"{}\" to {}", token, T::TYPE.name()))?;
    *cursor = rest;
    Ok(value)
}

/// Consume one ASCII token as a list length in the declared count type.
fn take_list_len(count_type: ScalarType, cursor: &mut &str) -> Result<usize, String> {
    let len = match count_type {
        ScalarType::Char => take_token::<i8>(cursor)?.list_len(),
        ScalarType::UChar => take_token::<u8>(cursor)?.list_len(),
        ScalarType::Short => take_token::<i16>(cursor)?.list_len(),
        ScalarType::UShort => take_token::<u16>(cursor)?.list_len(),
        ScalarType::Int => take_token::<i32>(cursor)?.list_len(),
        ScalarType::UInt => take_token::<u32>(cursor)?.list_len(),
        ScalarType::Float => take_token::<f32>(cursor)?.list_len(),
        ScalarType::Double => take_token::<f64>(cursor)?.list_len(),
    };
    len.map_err(String::from)
}

fn take_ascii_list<T: PlyScalar>(
    count_type: Option<ScalarType>,
    cursor: &mut &str,
) -> Result<Vec<T>, String> {
    let count_type = count_type.ok_or_else(|| "list property without count type".to_owned())?;
    let len = take_list_len(count_type, cursor)?;
    let mut row = Vec::with_capacity(len);
    for _ in 0..len {
        row.push(take_token::<T>(cursor)?);
    }
    Ok(row)
}

/// Decode one record's worth of one property from an ASCII line.
fn load_ascii_value(
    values: &mut PropertyValues,
    count_type: Option<ScalarType>,
    cursor: &mut &str,
) -> Result<(), String> {
    match values {
        PropertyValues::Char(v) => v.push(take_token(cursor)?),
        PropertyValues::UChar(v) => v.push(take_token(cursor)?),
        PropertyValues::Short(v) => v.push(take_token(cursor)?),
        PropertyValues::UShort(v) => v.push(take_token(cursor)?),
        PropertyValues::Int(v) => v.push(take_token(cursor)?),
        PropertyValues::UInt(v) => v.push(take_token(cursor)?),
        PropertyValues::Float(v) => v.push(take_token(cursor)?),
        PropertyValues::Double(v) => v.push(take_token(cursor)?),
        PropertyValues::CharList(v) => v.push(take_ascii_list(count_type, cursor)?),
        PropertyValues::UCharList(v) => v.push(take_ascii_list(count_type, cursor)?),
        PropertyValues::ShortList(v) => v.push(take_ascii_list(count_type, cursor)?),
        PropertyValues::UShortList(v) => v.push(take_ascii_list(count_type, cursor)?),
        PropertyValues::IntList(v) => v.push(take_ascii_list(count_type, cursor)?),
        PropertyValues::UIntList(v) => v.push(take_ascii_list(count_type, cursor)?),
        PropertyValues::FloatList(v) => v.push(take_ascii_list(count_type, cursor)?),
        PropertyValues::DoubleList(v) => v.push(take_ascii_list(count_type, cursor)?),
    }
    Ok(())
}

/// Map binary read failures: a short read becomes the EOF marker, anything
/// else stays an I/O error.
fn binary_read_error(error: io::Error) -> PlyError {
    if error.kind() == io::ErrorKind::UnexpectedEof {
        PlyError::Binary {
            message: "unexpected end of input".to_owned(),
        }
    } else {
        PlyError::Io(error)
    }
}

fn read_value<T: PlyScalar, R: Read>(reader: &mut R, endian: Endian) -> Result<T, PlyError> {
    T::read_binary(reader, endian).map_err(binary_read_error)
}

fn read_binary_list_len<R: Read>(
    count_type: ScalarType,
    reader: &mut R,
    endian: Endian,
) -> Result<usize, PlyError> {
    let len = match count_type {
        ScalarType::Char => read_value::<i8, R>(reader, endian)?.list_len(),
        ScalarType::UChar => read_value::<u8, R>(reader, endian)?.list_len(),
        ScalarType::Short => read_value::<i16, R>(reader, endian)?.list_len(),
        ScalarType::UShort => read_value::<u16, R>(reader, endian)?.list_len(),
        ScalarType::Int => read_value::<i32, R>(reader, endian)?.list_len(),
        ScalarType::UInt => read_value::<u32, R>(reader, endian)?.list_len(),
        ScalarType::Float => read_value::<f32, R>(reader, endian)?.list_len(),
        ScalarType::Double => read_value::<f64, R>(reader, endian)?.list_len(),
    };
    len.map_err(|message| PlyError::Binary {
        message: message.to_owned(),
    })
}

fn read_binary_list<T: PlyScalar, R: Read>(
    count_type: Option<ScalarType>,
    reader: &mut R,
    endian: Endian,
) -> Result<Vec<T>, PlyError> {
    let count_type = count_type.ok_or_else(|| PlyError::Binary {
        message: "list property without count type".to_owned(),
    })?;
    let len = read_binary_list_len(count_type, reader, endian)?;
    let mut row = Vec::with_capacity(len);
    for _ in 0..len {
        row.push(read_value::<T, R>(reader, endian)?);
    }
    Ok(row)
}

/// Decode one record's worth of one property from a binary body.
fn load_binary_value<R: Read>(
    values: &mut PropertyValues,
    count_type: Option<ScalarType>,
    reader: &mut R,
    endian: Endian,
) -> Result<(), PlyError> {
    match values {
        PropertyValues::Char(v) => v.push(read_value(reader, endian)?),
        PropertyValues::UChar(v) => v.push(read_value(reader, endian)?),
        PropertyValues::Short(v) => v.push(read_value(reader, endian)?),
        PropertyValues::UShort(v) => v.push(read_value(reader, endian)?),
        PropertyValues::Int(v) => v.push(read_value(reader, endian)?),
        PropertyValues::UInt(v) => v.push(read_value(reader, endian)?),
        PropertyValues::Float(v) => v.push(read_value(reader, endian)?),
        PropertyValues::Double(v) => v.push(read_value(reader, endian)?),
        PropertyValues::CharList(v) => v.push(read_binary_list(count_type, reader, endian)?),
        PropertyValues::UCharList(v) => v.push(read_binary_list(count_type, reader, endian)?),
        PropertyValues::ShortList(v) => v.push(read_binary_list(count_type, reader, endian)?),
        PropertyValues::UShortList(v) => v.push(read_binary_list(count_type, reader, endian)?),
        PropertyValues::IntList(v) => v.push(read_binary_list(count_type, reader, endian)?),
        PropertyValues::UIntList(v) => v.push(read_binary_list(count_type, reader, endian)?),
        PropertyValues::FloatList(v) => v.push(read_binary_list(count_type, reader, endian)?),
        PropertyValues::DoubleList(v) => v.push(read_binary_list(count_type, reader, endian)?),
    }
    Ok(())
}
