//! Documentation content for the sift CLI

use super::CliError;

/// Available documentation categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocCategory {
    Syntax,
    Comparisons,
    Functions,
    Quantifiers,
    Parameters,
    Schema,
}

impl DocCategory {
    pub const ALL: [DocCategory; 6] = [
        DocCategory::Syntax,
        DocCategory::Comparisons,
        DocCategory::Functions,
        DocCategory::Quantifiers,
        DocCategory::Parameters,
        DocCategory::Schema,
    ];

    /// Parse category name from string
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "syntax" => Some(Self::Syntax),
            "comparisons" | "comparison" | "operators" | "ops" => Some(Self::Comparisons),
            "functions" | "function" | "field_functions" => Some(Self::Functions),
            "quantifiers" | "quantifier" | "any" | "all" => Some(Self::Quantifiers),
            "parameters" | "parameter" | "params" | "paging" => Some(Self::Parameters),
            "schema" | "schemas" | "types" => Some(Self::Schema),
            _ => None,
        }
    }

    pub fn content(self) -> &'static str {
        match self {
            Self::Syntax => SYNTAX_DOC,
            Self::Comparisons => COMPARISONS_DOC,
            Self::Functions => FUNCTIONS_DOC,
            Self::Quantifiers => QUANTIFIERS_DOC,
            Self::Parameters => PARAMETERS_DOC,
            Self::Schema => SCHEMA_DOC,
        }
    }
}

/// Get the docs overview (category listing)
pub fn get_docs_overview() -> &'static str {
    r#"SIFT DOCUMENTATION

Sift is a request language for filtering, sorting and paginating collections
described by a schema. A request names a collection and lists parameters:

  users(filter(and(ge(age, 18), starts(name, "A"))), sort(desc(age)), limit(10))

DOCUMENTATION CATEGORIES

  syntax            Requests, field paths, literals and escaping
  comparisons       eq, ne, gt, ge, lt, le, has, starts, ends, regex
  functions         Field functions: date parts, rounding, case, isnull
  quantifiers       any/all over list fields and the $it marker
  parameters        filter, sort, skip, limit, count, input
  schema            Schema files, nullability and capability extensions

Run 'sift doc <category>' for detailed documentation.
"#
}

/// Get documentation for a specific category
pub fn get_doc_category(name: &str) -> Result<&'static str, CliError> {
    DocCategory::from_name(name)
        .map(DocCategory::content)
        .ok_or_else(|| CliError::UnknownCategory(name.to_string()))
}

const SYNTAX_DOC: &str = r#"SYNTAX

REQUESTS
  name(parameter, parameter, ...)
  Every parameter is a call; each may appear at most once.

FIELD PATHS
  age                 Plain field
  address.city        Nested field
  ["first name"]      Field whose name is not an identifier
  $it.price           Current item inside any/all

LITERALS
  42, -7              Integers
  3.14                Decimals (exact)
  "text"              Strings; escape \" and \\ with a backslash
  "2024-01-31"        Dates, when the schema expects a date
  "2024-01-31T10:00:00Z"
                      Timestamps, when the schema expects one
  true, false, null
  {"k": 1}, [1, 2]    Object and array literals (JSON)

WHITESPACE
  Spaces, tabs and newlines between tokens are ignored.
"#;

const COMPARISONS_DOC: &str = r#"COMPARISONS

A comparison takes a field (or field function) and a constant.

  eq(field, value)      Equal
  ne(field, value)      Not equal
  gt(field, value)      Greater than
  ge(field, value)      Greater than or equal
  lt(field, value)      Less than
  le(field, value)      Less than or equal
  has(field, value)     String contains substring, or array contains value
  starts(field, "p")    String starts with prefix
  ends(field, "s")      String ends with suffix
  regex(field, "re")    String matches regular expression

BOOLEAN LOGIC
  and(a, b, ...)        All operands hold (two or more)
  or(a, b, ...)         Any operand holds (two or more)
  not(a)                Negation

EXAMPLES
  eq(status, "active")
  or(lt(age, 18), ge(age, 65))
  not(has(tags, "archived"))
"#;

const FUNCTIONS_DOC: &str = r#"FIELD FUNCTIONS

A field function wraps a path on the left of a comparison or sort key.

DATE PARTS (datetime -> integer)
  year  month  day  hour  minute  second

ROUNDING (decimal -> number)
  round  floor  ceiling

CASE (string -> string)
  tolower  toupper

NULL TEST (any -> boolean)
  isnull

EXAMPLES
  eq(year(created), 2024)
  eq(tolower(email), "a@example.com")
  eq(isnull(deleted), true)
  sort(asc(tolower(name)))
"#;

const QUANTIFIERS_DOC: &str = r#"QUANTIFIERS

  any(collection, predicate)   At least one element satisfies predicate
  all(collection, predicate)   Every element satisfies predicate

Inside the predicate, $it names the element being tested. $it is only
meaningful inside a quantifier; nested quantifiers bind $it to the
innermost collection.

EXAMPLES
  any(orders, gt($it.total, 100))
  all(tags, ne($it, "hidden"))
  any(orders, any($it.lines, eq($it.sku, "A-1")))
"#;

const PARAMETERS_DOC: &str = r#"PARAMETERS

  filter(predicate)            Keep documents satisfying predicate
  sort(key, key, ...)          Order by keys: asc(field) or desc(field)
  skip(n)                      Drop the first n documents
  limit(n)                     Keep at most n documents
  count()                      Also report the number of matches before paging
  input(literal)               Object or array payload for the request

Sorting is stable and places nulls first. skip and limit must be
non-negative integers; 'sift check --max-limit' caps limit.
"#;

const SCHEMA_DOC: &str = r#"SCHEMA

A schema file maps request names to the type they return and may add
function signatures:

  {
    "requests": {
      "users": {
        "type": "list",
        "element": {
          "type": "object",
          "fields": {
            "age":  { "type": "integer" },
            "name": { "type": "string", "nullable": true },
            "tags": { "type": "list", "element": { "type": "string" } }
          }
        }
      }
    }
  }

Types: any, boolean, integer, decimal, string, date, datetime, object, list.

NULLABILITY
  eq(field, null) is only accepted when the field is nullable.

CAPABILITIES
  "extensions": { "filter": { "comparisons": ["eq", "ne"] } }
      Restricts the comparisons allowed on a field. A "functions" map
      lists the comparisons allowed per field function.
  "extensions": { "sortable": false }
      Forbids sorting on a field.
"#;
