//! Wire-level messages of the Cirrus Cloud management API.
//!
//! The messages are authored with prost derives so the crate builds
//! without a system `protoc`. Field numbering and optionality follow the
//! platform's published protobuf definitions; enum name tables mirror the
//! generated `*_value` maps and are consumed by the expand/flatten layer.

pub mod alb;
pub mod compute;
pub mod mdb;
pub mod operation;

/// Enum name table: protobuf spelling to wire ordinal.
pub type EnumTable = &'static [(&'static str, i32)];

/// Reverse lookup in an enum name table.
pub fn enum_name(table: EnumTable, value: i32) -> Option<&'static str> {
    table.iter().find(|(_, v)| *v == value).map(|(n, _)| *n)
}

/// Forward lookup in an enum name table.
pub fn enum_value(table: EnumTable, name: &str) -> Option<i32> {
    table.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
}

/// Names of the non-zero (user-specifiable) members of a table, for
/// "allowed values" diagnostics.
pub fn enum_allowed(table: EnumTable) -> Vec<&'static str> {
    table
        .iter()
        .filter(|(_, v)| *v != 0)
        .map(|(n, _)| *n)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: EnumTable = &[("UNSPECIFIED", 0), ("PRODUCTION", 1), ("PRESTABLE", 2)];

    #[test]
    fn table_lookups() {
        assert_eq!(enum_value(TABLE, "PRESTABLE"), Some(2));
        assert_eq!(enum_value(TABLE, "STAGING"), None);
        assert_eq!(enum_name(TABLE, 1), Some("PRODUCTION"));
        assert_eq!(enum_name(TABLE, 9), None);
        assert_eq!(enum_allowed(TABLE), vec!["PRODUCTION", "PRESTABLE"]);
    }
}
