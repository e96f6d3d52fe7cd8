//! Static descriptors for every entity the dashboard manages.
//!
//! One generic controller drives all of them; everything entity-specific
//! (endpoints, routes, form fields, field maps, list columns, foreign-key
//! lookups and many-to-many relations) lives in these tables.

use crate::forms::{FieldDef, FieldKind, FieldMap, Initial, Rule};

#[derive(Debug)]
pub struct Entity {
    /// API endpoint, relative to the API base URL.
    pub endpoint: &'static str,
    pub singular: &'static str,
    pub plural: &'static str,
    pub list_path: &'static str,
    pub edit_path: &'static str,
    pub fields: &'static [FieldDef],
    /// Scalar form fields sent to / read from the API.
    pub field_map: FieldMap,
    /// Select fields filled from another collection.
    pub choices: &'static [ChoiceSource],
    pub columns: &'static [Column],
    /// Foreign keys resolved to display names on list pages.
    pub lookups: &'static [Lookup],
    pub relations: &'static [Relation],
}

#[derive(Debug)]
pub struct ChoiceSource {
    pub field: &'static str,
    pub endpoint: &'static str,
}

#[derive(Debug)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
}

#[derive(Debug)]
pub struct Lookup {
    pub foreign_key: &'static str,
    pub endpoint: &'static str,
    /// Row key the related record's `name` is stored under.
    pub display_key: &'static str,
}

/// A many-to-many association stored as join records on `endpoint`.
#[derive(Debug)]
pub struct Relation {
    /// Multi-select form field holding the selected child ids.
    pub field: &'static str,
    pub endpoint: &'static str,
    pub parent_key: &'static str,
    pub child_key: &'static str,
}

impl Entity {
    /// Edit URL for an existing record.
    pub fn edit_url(&self, id: i64) -> String {
        format!("{}?id={id}", self.edit_path)
    }
}

const fn id_field(label: &'static str) -> FieldDef {
    FieldDef {
        name: "id",
        label,
        kind: FieldKind::Hidden,
        rules: &[Rule::Optional],
        default: Initial::None,
        description: None,
    }
}

const fn text(name: &'static str, label: &'static str, rules: &'static [Rule]) -> FieldDef {
    FieldDef {
        name,
        label,
        kind: FieldKind::Text,
        rules,
        default: Initial::None,
        description: None,
    }
}

const fn select(name: &'static str, label: &'static str, rules: &'static [Rule]) -> FieldDef {
    FieldDef {
        name,
        label,
        kind: FieldKind::Select,
        rules,
        default: Initial::None,
        description: None,
    }
}

const fn checkbox(name: &'static str, label: &'static str, on: bool, description: Option<&'static str>) -> FieldDef {
    FieldDef {
        name,
        label,
        kind: FieldKind::Checkbox,
        rules: &[Rule::Optional],
        default: Initial::Bool(on),
        description,
    }
}

const fn column(key: &'static str, label: &'static str) -> Column {
    Column { key, label }
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

pub static TARGET: Entity = Entity {
    endpoint: "target",
    singular: "Target",
    plural: "Targets",
    list_path: "/targets",
    edit_path: "/target/edit",
    fields: &[
        id_field("Target ID"),
        text("domain", "Domain", &[Rule::Required("The domain is required")]),
        text("identifier", "Identifier", &[Rule::Required("A short identifier is required")]),
        FieldDef {
            name: "sleep",
            label: "Sleep",
            kind: FieldKind::Integer,
            rules: &[Rule::Required("This field is required."), Rule::Numeric],
            default: Initial::Int(30),
            description: Some("Standby interval in seconds"),
        },
        FieldDef {
            name: "providers",
            label: "Proxy Providers",
            kind: FieldKind::MultiSelect,
            rules: &[Rule::Optional],
            default: Initial::None,
            description: None,
        },
        FieldDef {
            name: "plans",
            label: "Provider Plans",
            kind: FieldKind::MultiSelect,
            rules: &[Rule::Optional],
            default: Initial::None,
            description: None,
        },
    ],
    field_map: &[("domain", "domain"), ("identifier", "identifier"), ("sleep", "sleep")],
    choices: &[
        ChoiceSource { field: "providers", endpoint: "provider" },
        ChoiceSource { field: "plans", endpoint: "provider_plan" },
    ],
    columns: &[
        column("id", "ID"),
        column("domain", "Domain"),
        column("identifier", "Identifier"),
        column("sleep", "Sleep"),
    ],
    lookups: &[],
    relations: &[
        Relation {
            field: "providers",
            endpoint: "target_provider",
            parent_key: "target_id",
            child_key: "provider_id",
        },
        Relation {
            field: "plans",
            endpoint: "target_provider_plan",
            parent_key: "target_id",
            child_key: "provider_plan_id",
        },
    ],
};

// ---------------------------------------------------------------------------
// Proxies
// ---------------------------------------------------------------------------

pub static PROXY: Entity = Entity {
    endpoint: "proxy",
    singular: "Proxy",
    plural: "Proxies",
    list_path: "/proxies",
    edit_path: "/proxy/edit",
    fields: &[
        id_field("Proxy ID"),
        text("url", "Proxy URL", &[Rule::Required("URL is required"), Rule::Url]),
        checkbox("active", "Active", true, None),
        select("proxy_type", "Proxy Type", &[Rule::Required("This field is required.")]),
        select("proxy_location", "Proxy Location", &[Rule::Optional]),
        select("provider", "Provider", &[Rule::Optional]),
        select("provider_plan", "Provider Plan", &[Rule::Optional]),
        FieldDef {
            name: "tor_control_port",
            label: "Tor Control Port",
            kind: FieldKind::Integer,
            rules: &[Rule::Optional, Rule::Numeric],
            default: Initial::None,
            description: None,
        },
        FieldDef {
            name: "tor_control_pswd",
            label: "Tor Control Password",
            kind: FieldKind::Text,
            rules: &[Rule::Optional],
            default: Initial::None,
            description: None,
        },
        checkbox(
            "tor_renew_identity",
            "Tor Renew Identity",
            false,
            Some("For Tor: force renew identity when blocked"),
        ),
        checkbox(
            "dont_block",
            "Do Not Block",
            false,
            Some("Never mark proxy as blocked - Do Not Sleep"),
        ),
    ],
    field_map: &[
        ("url", "url"),
        ("active", "active"),
        ("proxy_type", "proxy_type_id"),
        ("proxy_location", "proxy_location_id"),
        ("provider", "provider_id"),
        ("provider_plan", "provider_plan_id"),
        ("tor_control_port", "tor_control_port"),
        ("tor_control_pswd", "tor_control_pswd"),
        ("tor_renew_identity", "tor_renew_identity"),
        ("dont_block", "dont_block"),
    ],
    choices: &[
        ChoiceSource { field: "proxy_type", endpoint: "proxy_type" },
        ChoiceSource { field: "proxy_location", endpoint: "proxy_location" },
        ChoiceSource { field: "provider", endpoint: "provider" },
        ChoiceSource { field: "provider_plan", endpoint: "provider_plan" },
    ],
    columns: &[
        column("id", "ID"),
        column("url", "URL"),
        column("active", "Active"),
        column("proxy_type_name", "Type"),
        column("proxy_location_name", "Location"),
        column("provider_name", "Provider"),
        column("provider_plan_name", "Plan"),
    ],
    lookups: &[
        Lookup { foreign_key: "proxy_type_id", endpoint: "proxy_type", display_key: "proxy_type_name" },
        Lookup {
            foreign_key: "proxy_location_id",
            endpoint: "proxy_location",
            display_key: "proxy_location_name",
        },
        Lookup { foreign_key: "provider_id", endpoint: "provider", display_key: "provider_name" },
        Lookup {
            foreign_key: "provider_plan_id",
            endpoint: "provider_plan",
            display_key: "provider_plan_name",
        },
    ],
    relations: &[],
};

// ---------------------------------------------------------------------------
// Proxy types and locations
// ---------------------------------------------------------------------------

pub static PROXY_TYPE: Entity = Entity {
    endpoint: "proxy_type",
    singular: "Proxy Type",
    plural: "Proxy Types",
    list_path: "/proxy-types",
    edit_path: "/proxy-type/edit",
    fields: &[
        id_field("Proxy Type ID"),
        text("name", "Type Name", &[Rule::Required("A name is required"), Rule::Length { min: 1, max: 20 }]),
        text("code", "Type Code", &[Rule::Required("A code is required"), Rule::Length { min: 1, max: 4 }]),
    ],
    field_map: &[("name", "name"), ("code", "code")],
    choices: &[],
    columns: &[column("id", "ID"), column("name", "Name"), column("code", "Code")],
    lookups: &[],
    relations: &[],
};

pub static PROXY_LOCATION: Entity = Entity {
    endpoint: "proxy_location",
    singular: "Proxy Location",
    plural: "Proxy Locations",
    list_path: "/proxy-locations",
    edit_path: "/proxy-location/edit",
    fields: &[
        id_field("Proxy Location ID"),
        text(
            "name",
            "Location Name",
            &[Rule::Required("A name is required"), Rule::Length { min: 1, max: 256 }],
        ),
        text("code", "Location Code", &[Rule::Required("A code is required"), Rule::Length { min: 1, max: 4 }]),
    ],
    field_map: &[("name", "name"), ("code", "code")],
    choices: &[],
    columns: &[column("id", "ID"), column("name", "Name"), column("code", "Code")],
    lookups: &[],
    relations: &[],
};

// ---------------------------------------------------------------------------
// Providers and plans
// ---------------------------------------------------------------------------

pub static PROVIDER: Entity = Entity {
    endpoint: "provider",
    singular: "Provider",
    plural: "Providers",
    list_path: "/providers",
    edit_path: "/provider/edit",
    fields: &[
        id_field("Provider ID"),
        text(
            "name",
            "Provider Name",
            &[Rule::Required("A name is required"), Rule::Length { min: 1, max: 256 }],
        ),
        text("url", "Provider URL", &[Rule::Optional, Rule::Url]),
        text("code", "Provider Code", &[Rule::Required("A code is required"), Rule::Length { min: 1, max: 8 }]),
    ],
    field_map: &[("name", "name"), ("url", "url"), ("code", "code")],
    choices: &[],
    columns: &[column("id", "ID"), column("name", "Name"), column("url", "URL"), column("code", "Code")],
    lookups: &[],
    relations: &[],
};

pub static PROVIDER_PLAN: Entity = Entity {
    endpoint: "provider_plan",
    singular: "Provider Plan",
    plural: "Provider Plans",
    list_path: "/provider-plans",
    edit_path: "/provider-plan/edit",
    fields: &[
        id_field("Provider Plan ID"),
        select("provider", "The Provider", &[Rule::Required("This field is required.")]),
        text(
            "name",
            "Provider Plan Name",
            &[Rule::Required("A name is required"), Rule::Length { min: 1, max: 256 }],
        ),
        text(
            "code",
            "Provider Plan Code",
            &[Rule::Required("A code is required"), Rule::Length { min: 1, max: 8 }],
        ),
    ],
    field_map: &[("provider", "provider_id"), ("name", "name"), ("code", "code")],
    choices: &[ChoiceSource { field: "provider", endpoint: "provider" }],
    columns: &[
        column("id", "ID"),
        column("provider_name", "Provider"),
        column("name", "Name"),
        column("code", "Code"),
    ],
    lookups: &[Lookup { foreign_key: "provider_id", endpoint: "provider", display_key: "provider_name" }],
    relations: &[],
};

/// Every managed entity, in navigation order.
pub static ENTITIES: &[&Entity] = &[&TARGET, &PROXY, &PROXY_TYPE, &PROXY_LOCATION, &PROVIDER, &PROVIDER_PLAN];

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::forms::{Choice, Form};
    use crate::net::Record;

    /// A stored record per entity, with blank and null optional values and
    /// ids as the API sometimes sends them (strings).
    fn stored(entity: &Entity) -> Value {
        match entity.endpoint {
            "target" => json!({"id": "7", "domain": "example.com", "identifier": "ex", "sleep": 60}),
            "proxy" => json!({
                "id": "12",
                "url": "http://10.0.0.1:8080",
                "active": false,
                "proxy_type_id": 1,
                "proxy_location_id": null,
                "provider_id": 2,
                "provider_plan_id": null,
                "tor_control_port": null,
                "tor_control_pswd": "",
                "tor_renew_identity": true,
                "dont_block": false
            }),
            "proxy_type" => json!({"id": 3, "name": "HTTP", "code": "HTTP"}),
            "proxy_location" => json!({"id": "4", "name": "Paris", "code": "FR"}),
            "provider" => json!({"id": 4, "name": "Acme", "url": "", "code": "AC"}),
            "provider_plan" => json!({"id": 9, "provider_id": 2, "name": "Basic", "code": "B1"}),
            other => panic!("no stored record for {other}"),
        }
    }

    fn form_with_choices(entity: &Entity) -> Form {
        let mut form = Form::new(entity.fields);
        for source in entity.choices {
            let choices = (1..=5).map(|id| Choice { id, label: format!("#{id}") }).collect();
            form.set_choices(source.field, choices);
        }
        form
    }

    #[test]
    fn test_unchanged_edit_form_resubmits_the_stored_fields() {
        for entity in ENTITIES {
            let record = stored(entity);
            let record = record.as_object().unwrap();
            let id = record["id"].as_i64().or_else(|| record["id"].as_str()?.parse().ok());

            let mut shown = form_with_choices(entity);
            shown.populate(record, entity.field_map);

            let mut submitted = form_with_choices(entity);
            submitted.bind(&shown.resubmission());
            assert!(submitted.validate(), "{}: {:?}", entity.endpoint, submitted.views());
            assert_eq!(submitted.id(), id, "{}", entity.endpoint);

            let expected: Record = entity
                .field_map
                .iter()
                .map(|(_, api)| (api.to_string(), record[*api].clone()))
                .collect();
            assert_eq!(submitted.payload(entity.field_map), expected, "{}", entity.endpoint);
        }
    }

    #[test]
    fn test_field_maps_reference_declared_fields() {
        for entity in ENTITIES {
            for (form_field, _) in entity.field_map {
                assert!(
                    entity.fields.iter().any(|f| f.name == *form_field),
                    "{}: field map names unknown field {form_field}",
                    entity.endpoint
                );
            }
            for source in entity.choices {
                let def = entity.fields.iter().find(|f| f.name == source.field).unwrap();
                assert!(matches!(def.kind, FieldKind::Select | FieldKind::MultiSelect));
            }
            for relation in entity.relations {
                let def = entity.fields.iter().find(|f| f.name == relation.field).unwrap();
                assert_eq!(def.kind, FieldKind::MultiSelect);
            }
        }
    }

    #[test]
    fn test_every_form_has_an_id_field() {
        for entity in ENTITIES {
            assert_eq!(entity.fields[0].name, "id", "{}", entity.endpoint);
            assert_eq!(entity.fields[0].kind, FieldKind::Hidden);
        }
    }

    #[test]
    fn test_routes_are_unique() {
        let mut paths: Vec<&str> = ENTITIES.iter().flat_map(|e| [e.list_path, e.edit_path]).collect();
        let before = paths.len();
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(paths.len(), before);
    }

    #[test]
    fn test_proxy_foreign_keys() {
        let api_fields: Vec<&str> = PROXY.field_map.iter().map(|(_, api)| *api).collect();
        for fk in ["proxy_type_id", "proxy_location_id", "provider_id", "provider_plan_id"] {
            assert!(api_fields.contains(&fk));
            assert!(PROXY.lookups.iter().any(|l| l.foreign_key == fk));
        }
    }

    #[test]
    fn test_edit_url() {
        assert_eq!(PROXY_TYPE.edit_url(4), "/proxy-type/edit?id=4");
    }
}
