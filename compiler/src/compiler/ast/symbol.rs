use std::fmt;

use super::ScopeId;

/// Symbol kinds associated with an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Literal,
    Variable,
    Constant,
    Argument,
    Function,
    Property,
    Class,
}

/// Data types of the source language. `Object` symbols name the class they
/// instantiate through `Symbol::parent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolDataType {
    Undefined,
    Integer,
    Boolean,
    String,
    Object,
    Nil,
}

impl SymbolDataType {
    /// Map a base type name to a data type. Any name that is not a built-in
    /// type is taken to be a class name.
    pub fn parse(type_name: &str) -> SymbolDataType {
        match type_name {
            "integer" => SymbolDataType::Integer,
            "string" => SymbolDataType::String,
            "boolean" => SymbolDataType::Boolean,
            _ => SymbolDataType::Object,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            SymbolDataType::Undefined => "undefined",
            SymbolDataType::Integer => "integer",
            SymbolDataType::Boolean => "boolean",
            SymbolDataType::String => "string",
            SymbolDataType::Object => "object",
            SymbolDataType::Nil => "null",
        }
    }

    /// Byte width of a scalar of this type. String values are pointers.
    pub const fn scalar_size(&self) -> usize {
        match self {
            SymbolDataType::Integer | SymbolDataType::String => 4,
            SymbolDataType::Boolean | SymbolDataType::Nil => 1,
            SymbolDataType::Object => 4,
            SymbolDataType::Undefined => 0,
        }
    }
}

impl fmt::Display for SymbolDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Source form of a literal token, recorded by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Integer,
    String,
    Boolean,
    Null,
}

/// Symbol defines the data associated with an identifier.
///
///   + `parent` — for Object symbols the class they instantiate, for Class
///     symbols the superclass; empty otherwise.
///   + `label` — scope-qualified prefix (`"{scope_id}_"`) stamped on insert,
///     used to form globally unique target names.
///   + `value` — literal text for literals and constant initializers; for
///     array literals the semicolon-joined element values.
///   + `arg_list` — parameters of a Function, constructor parameters of a
///     Class.
///   + `definition` — for Function and Class, the scope holding the body.
///   + `dimensions` — per-dimension lengths, empty for scalars.
///   + `offset` — byte offset within the enclosing class for properties.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub data_type: SymbolDataType,
    pub parent: String,
    pub label: String,
    pub value: String,
    pub arg_list: Vec<Symbol>,
    pub definition: Option<ScopeId>,
    pub size: usize,
    pub dimensions: Vec<usize>,
    pub offset: usize,
}

impl Default for Symbol {
    fn default() -> Self {
        Symbol {
            name: String::new(),
            kind: SymbolKind::Variable,
            data_type: SymbolDataType::Undefined,
            parent: String::new(),
            label: String::new(),
            value: String::new(),
            arg_list: Vec::new(),
            definition: None,
            size: 0,
            dimensions: Vec::new(),
            offset: 0,
        }
    }
}

impl Symbol {
    pub fn new(name: String, kind: SymbolKind, data_type: SymbolDataType) -> Self {
        Symbol {
            name,
            kind,
            data_type,
            size: data_type.scalar_size(),
            ..Symbol::default()
        }
    }

    /// Build the symbol of a literal token.
    pub fn from_literal(text: &str, kind: LiteralKind) -> Self {
        let data_type = match kind {
            LiteralKind::Integer => SymbolDataType::Integer,
            LiteralKind::String => SymbolDataType::String,
            LiteralKind::Boolean => SymbolDataType::Boolean,
            LiteralKind::Null => SymbolDataType::Nil,
        };
        Symbol {
            value: text.to_string(),
            ..Symbol::new(String::new(), SymbolKind::Literal, data_type)
        }
    }

    pub fn is_array(&self) -> bool {
        !self.dimensions.is_empty()
    }

    /// True when values of this symbol are stored byte-wide.
    pub fn is_byte_sized(&self) -> bool {
        !self.is_array()
            && matches!(self.data_type, SymbolDataType::Boolean | SymbolDataType::Nil)
    }

    /// Storage-class letter of the target name: `W` word cells, `B` byte
    /// cells, `S` pointers and backing storage, `F` subroutine labels.
    pub fn storage_prefix(&self) -> char {
        if self.kind == SymbolKind::Function {
            return 'F';
        }
        if self.is_array() {
            return 'S';
        }
        match self.data_type {
            SymbolDataType::Integer | SymbolDataType::Undefined => 'W',
            SymbolDataType::Boolean | SymbolDataType::Nil => 'B',
            SymbolDataType::String | SymbolDataType::Object => 'S',
        }
    }

    /// The globally unique target name, `prefix + label + name`, e.g.
    /// `W0_x` or `F1_constructor`.
    pub fn target_name(&self) -> String {
        format!("{}{}{}", self.storage_prefix(), self.label, self.name)
    }

    /// Byte width of one scalar element once every dimension is stripped.
    pub fn scalar_element_size(&self) -> usize {
        let elements: usize = self.dimensions.iter().product();
        if elements > 0 {
            self.size / elements
        } else {
            self.size
        }
    }

    /// Byte stride between consecutive elements of the outermost dimension.
    pub fn element_stride(&self) -> usize {
        match self.dimensions.first() {
            Some(&length) if length > 0 => self.size / length,
            _ => self.size,
        }
    }
}
