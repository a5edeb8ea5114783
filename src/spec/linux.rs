use serde::{Deserialize, Serialize};

/// A namespace the helper creates for the sandbox.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    #[serde(rename = "type")]
    pub ns_type: String,
}

/// One uid/gid mapping tuple for the user namespace.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IdMap {
    pub host_id: u64,
    pub container_id: u64,
    pub size: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Linux {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<Namespace>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uid_mappings: Vec<IdMap>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gid_mappings: Vec<IdMap>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_id_map_wire_names() -> Result<()> {
        let map = IdMap {
            host_id: 1000,
            container_id: 0,
            size: 1,
        };
        let json = serde_json::to_string(&map)?;
        assert_eq!(json, r#"{"hostId":1000,"containerId":0,"size":1}"#);
        Ok(())
    }
}
