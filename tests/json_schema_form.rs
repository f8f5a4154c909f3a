use std::sync::{Arc, Mutex};

use calmform::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

const COMBINED_MESSAGE: &str = "a.length + b.length > 9";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SignUpForm {
    id: String,
    others: Others,
    password: String,
    username: String,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Others {
    a: String,
    b: String,
}

fn blank_form() -> SignUpForm {
    SignUpForm {
        id: String::new(),
        others: Others {
            a: String::new(),
            b: String::new(),
        },
        password: String::new(),
        username: String::new(),
        tags: Vec::new(),
    }
}

fn short_text() -> serde_json::Value {
    json!({ "type": "string", "maxLength": 5 })
}

fn sign_up_controller(initial: SignUpForm) -> FormController<SignUpForm> {
    let document = json!({
        "type": "object",
        "required": ["id", "others", "password", "username"],
        "properties": {
            "id": short_text(),
            "others": {
                "type": "object",
                "required": ["a", "b"],
                "properties": { "a": short_text(), "b": short_text() }
            },
            "password": short_text(),
            "username": short_text(),
            "tags": { "type": "array", "items": { "type": "string", "minLength": 1 } }
        }
    });
    let schema = JsonSchema::new(&document)
        .expect("sign-up schema compiles")
        .with_message("id", "Invalid id")
        .with_message("others.a", "Invalid others.a")
        .with_message("others.b", "Invalid others.b")
        .with_message("password", "Invalid password")
        .with_message("username", "Invalid username")
        .and_then(|form: &SignUpForm| -> Result<(), Vec<Issue>> {
            if form.others.a.len() + form.others.b.len() > 9 {
                Err(vec![Issue::root(COMBINED_MESSAGE).within("others")])
            } else {
                Ok(())
            }
        });
    FormController::new(schema, initial)
}

fn submit(controller: &FormController<SignUpForm>) -> bool {
    let outcome = Arc::new(Mutex::new(None));
    let on_submit = {
        let outcome = outcome.clone();
        controller.create_on_submit(move |is_valid| {
            *outcome.lock().expect("outcome lock") = Some(is_valid);
            Ok(())
        })
    };
    let mut event = FormSubmitEvent::new();
    on_submit(Some(&mut event)).expect("submit");
    assert!(event.is_default_prevented());

    let valid = *outcome.lock().expect("outcome lock");
    valid.expect("handler ran")
}

#[test]
fn deferred_until_submit_then_full_check() {
    let controller = sign_up_controller(SignUpForm {
        password: "123456".into(),
        username: "123456".into(),
        ..blank_form()
    });
    assert!(controller.is_valid().expect("valid"));

    assert!(!submit(&controller));
    assert!(!controller.is_valid().expect("valid"));
    assert_eq!(
        controller.get_error("password").expect("error").as_deref(),
        Some("Invalid password")
    );
    assert_eq!(
        controller.get_error("username").expect("error").as_deref(),
        Some("Invalid username")
    );
    assert_eq!(controller.get_error("id").expect("error"), None);
}

#[test]
fn nested_field_error_is_not_reported_on_its_parent() {
    let controller = sign_up_controller(SignUpForm {
        others: Others {
            a: "123456".into(),
            b: String::new(),
        },
        ..blank_form()
    });

    assert!(!submit(&controller));
    assert_eq!(
        controller.get_error("others.a").expect("error").as_deref(),
        Some("Invalid others.a")
    );
    assert_eq!(controller.get_error("others").expect("error"), None);
    assert_eq!(controller.get_error("password").expect("error"), None);
}

#[test]
fn object_check_is_reported_on_the_object() {
    let controller = sign_up_controller(SignUpForm {
        others: Others {
            a: "12345".into(),
            b: "12345".into(),
        },
        ..blank_form()
    });

    assert!(!submit(&controller));
    assert_eq!(
        controller.get_error("others").expect("error").as_deref(),
        Some(COMBINED_MESSAGE)
    );
    assert_eq!(controller.get_error("others.a").expect("error"), None);
}

#[test]
fn fixing_the_value_after_submit_clears_errors() {
    let controller = sign_up_controller(SignUpForm {
        password: "123456".into(),
        ..blank_form()
    });
    assert!(!submit(&controller));

    controller
        .set_form_state(json!({ "password": "12345" }))
        .expect("merge password");
    assert!(controller.is_valid().expect("valid"));
    assert!(submit(&controller));
}

#[test]
fn opted_in_field_reports_while_typing() {
    let controller = sign_up_controller(blank_form());
    controller
        .set_immediately_validated_key("username", true)
        .expect("enable username");

    controller
        .set_form_state(json!({ "username": "abcdef", "id": "abcdef" }))
        .expect("merge");
    assert_eq!(
        controller.get_error("username").expect("error").as_deref(),
        Some("Invalid username")
    );
    assert_eq!(controller.get_error("id").expect("error"), None);

    controller
        .set_immediately_validated_key("username", false)
        .expect("disable username");
    assert!(controller.is_valid().expect("valid"));
}

#[test]
fn array_entries_are_keyed_by_bare_index() {
    let controller = sign_up_controller(blank_form());
    controller
        .set_values(json!({ "tags": ["rust", ""] }))
        .expect("replace tags");
    assert!(!submit(&controller));

    let errors = controller
        .errors()
        .expect("errors")
        .expect("tag error is visible");
    assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["tags.1"]);
}
