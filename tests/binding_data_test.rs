//! Binding data built for whole services: response ordering, payload
//! classification and name mapping.

use httpgen::design::{Action, Attribute, DataType, Design, HttpResponse, Object, Service};
use httpgen::rest::{ActionData, map_attributes};
use httpgen::{Config, Generator};

fn build_action(design: &Design, service: &str) -> ActionData {
    let generator = Generator::new(Config::default()).unwrap();
    let service = design.service(service).unwrap();
    generator
        .server_data(design, service)
        .unwrap()
        .action_data
        .remove(0)
}

fn order_design(responses: Vec<HttpResponse>) -> Design {
    let mut action = Action::new("create")
        .with_route("POST", "/")
        .with_result(Attribute::user("Order"));
    for response in responses {
        action = action.with_response(response);
    }
    Design::new()
        .with_type(
            "Order",
            Attribute::object(
                Object::new()
                    .with("id", Attribute::int())
                    .with("state", Attribute::string()),
            )
            .required(["id", "state"]),
        )
        .with_service(Service::new("orders").with_action(action))
}

#[test]
fn test_untagged_response_is_last() {
    let design = order_design(vec![
        HttpResponse::new(201),
        HttpResponse::new(202).with_tag("state", "pending"),
        HttpResponse::new(409).with_tag("state", "conflict"),
    ]);

    let action = build_action(&design, "orders");
    let statuses: Vec<_> = action.responses.iter().map(|r| r.status_code).collect();
    assert_eq!(statuses.len(), 3);
    assert_eq!(statuses.last(), Some(&"CREATED"));
    assert!(action.responses.last().unwrap().tag_condition.is_none());
    assert_eq!(
        action.responses[0].tag_condition.as_deref(),
        Some("t.state == \"conflict\"")
    );
}

#[test]
fn test_only_first_untagged_response_survives() {
    let design = order_design(vec![
        HttpResponse::new(200),
        HttpResponse::new(202).with_tag("state", "pending"),
        HttpResponse::new(201),
    ]);

    let action = build_action(&design, "orders");
    let statuses: Vec<_> = action.responses.iter().map(|r| r.status_code).collect();
    assert_eq!(statuses, vec!["ACCEPTED", "OK"]);
}

#[test]
fn test_response_body_names_include_status_text() {
    let design = order_design(vec![
        HttpResponse::new(201),
        HttpResponse::new(202)
            .with_tag("state", "pending")
            .with_headers(Attribute::object(
                Object::new().with("state:X-State", Attribute::string()),
            )),
    ]);

    let action = build_action(&design, "orders");
    assert_eq!(
        action.responses[0].body_type_name.as_deref(),
        Some("OrdersCreateAcceptedResponseBody")
    );
    assert_eq!(
        action.responses[1].body_type_name.as_deref(),
        Some("service::Order")
    );
}

#[test]
fn test_post_with_path_param_and_body() {
    let design = Design::new().with_service(
        Service::new("items").with_action(
            Action::new("update")
                .with_route("POST", "/{id}")
                .with_payload(
                    Attribute::object(
                        Object::new()
                            .with("id", Attribute::int())
                            .with("name", Attribute::string()),
                    )
                    .required(["id", "name"]),
                )
                .with_params(
                    Attribute::object(Object::new().with("id", Attribute::int())).required(["id"]),
                )
                .with_response(HttpResponse::new(204)),
        ),
    );

    let action = build_action(&design, "items");
    let payload = action.payload.as_ref().unwrap();
    fn names(params: &[httpgen::rest::ParamData]) -> Vec<&str> {
        params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>()
    }
    assert_eq!(names(&payload.path_params), vec!["id"]);
    assert!(payload.query_params.is_empty());
    assert_eq!(names(&payload.all_params), vec!["id"]);
    assert_eq!(
        payload.body_type_name.as_deref(),
        Some("ItemsUpdateRequestBody")
    );
    assert_eq!(payload.arguments, vec!["body", "id"]);

    let generator = Generator::new(Config::default()).unwrap();
    let artifacts = generator.generate(&design).unwrap();
    let content = &artifacts[0].content;
    assert!(content.contains("let body: ItemsUpdateRequestBody = rt::decode_body(req)?;"));
    assert!(content.contains(".path_param(\"id\")"));
    assert!(content.contains("Ok(service::new_update_items_payload(body, id))"));
}

#[test]
fn test_name_mapping() {
    let design = Design::new().with_type(
        "User",
        Attribute::object(
            Object::new()
                .with("id", Attribute::int())
                .with("full_name", Attribute::string()),
        ),
    );
    let logical = DataType::User("User".to_string());

    let wire = Attribute::object(
        Object::new()
            .with("id", Attribute::int())
            .with("full_name:name", Attribute::string()),
    );
    let mapping = map_attributes(&design, &logical, &wire.data_type);
    assert_eq!(mapping.wire_name("full_name"), Some("name"));
    assert_eq!(mapping.wire_name("id"), Some("id"));
    assert!(mapping.renamed);

    let same = map_attributes(&design, &logical, &logical);
    assert!(!same.renamed);
    assert_eq!(same.fields.len(), 2);
}
