mod common;

use std::rc::Rc;

use common::{FakeOrg, account, attach, case, contact, get_str, set};
use forcemodel::prelude::*;
use forcemodel::{LimitErrorKind, send_trees_checked};
use serde_json::json;

fn sequential() -> Rc<SequentialReferenceIds> {
    Rc::new(SequentialReferenceIds::new("ref"))
}

/// Account -> Contact -> Case, every record new.
fn account_graph(name: &str) -> (SObjectRef, SObjectRef, SObjectRef) {
    let acme = account(name);
    let smith = contact("Smith");
    let ticket = case("Broken widget");
    attach(&acme, "contacts", &smith, "account");
    attach(&smith, "cases", &ticket, "contact");
    (acme, smith, ticket)
}

#[test]
fn test_nested_graph_is_created_in_one_request() {
    let (acme, smith, ticket) = account_graph("Acme");
    let org = FakeOrg::new();
    let mut sender = TreeSender::new("Account", &org).with_reference_ids(sequential());
    sender.add_root(acme.clone()).unwrap();

    let result = sender.commit().unwrap();

    assert!(result.success());
    assert_eq!(result.requests_sent(), 1);
    assert_eq!(result.records_created(), 3);
    assert_eq!(org.requests.borrow()[0].0, "composite/tree/Account");
    assert_eq!(
        org.body(0),
        json!({
            "records": [{
                "attributes": {"type": "Account", "referenceId": "ref1"},
                "Name": "Acme",
                "Contacts": {"records": [{
                    "attributes": {"type": "Contact", "referenceId": "ref2"},
                    "LastName": "Smith",
                    "Cases": {"records": [{
                        "attributes": {"type": "Case", "referenceId": "ref3"},
                        "Subject": "Broken widget"
                    }]}
                }]}
            }]
        })
    );

    assert_eq!(acme.id().as_deref(), Some("id0001"));
    assert_eq!(smith.id().as_deref(), Some("id0002"));
    assert_eq!(ticket.id().as_deref(), Some("id0003"));
    assert_eq!(get_str(&smith, "account_id").as_deref(), Some("id0001"));
    assert_eq!(get_str(&ticket, "contact_id").as_deref(), Some("id0002"));
    for record in [&acme, &smith, &ticket] {
        assert!(!record.borrow().has_changes(), "{record} still dirty");
    }
}

#[test]
fn test_persisted_records_are_skipped_with_their_subtrees() {
    let acme = account("Acme");
    let existing = contact("Jones");
    let nested = case("Never sent");
    attach(&acme, "contacts", &existing, "account");
    attach(&existing, "cases", &nested, "contact");
    existing.borrow_mut().set_id("003000000000001");
    let fresh = contact("Smith");
    attach(&acme, "contacts", &fresh, "account");

    let org = FakeOrg::new();
    let mut sender = TreeSender::new("Account", &org).with_reference_ids(sequential());
    sender.add_root(acme.clone()).unwrap();
    sender.commit().unwrap();

    let body = org.body(0);
    let contacts = body["records"][0]["Contacts"]["records"].as_array().unwrap();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0]["LastName"], "Smith");
    assert_eq!(nested.id(), None);
    assert_eq!(get_str(&fresh, "account_id"), acme.id());
}

#[test]
fn test_traversable_view_of_graph() {
    let (acme, smith, ticket) = account_graph("Acme");

    assert!(acme.is_traversable_root());
    assert!(!smith.is_traversable_root());

    let children = smith.traversable_children();
    assert_eq!(children.keys().collect::<Vec<_>>(), vec!["Cases"]);
    assert!(children["Cases"].contains(&ticket));

    let parents = smith.traversable_parents();
    assert_eq!(parents.keys().collect::<Vec<_>>(), vec!["Account"]);
    assert!(parents["Account"].contains(&acme));
}

#[test]
fn test_trees_are_split_across_requests_when_allowed() {
    let roots: Vec<SObjectRef> = (0..3)
        .map(|i| {
            let root = account(&format!("Account {i}"));
            attach(&root, "contacts", &contact("A"), "account");
            attach(&root, "contacts", &contact("B"), "account");
            root
        })
        .collect();
    let org = FakeOrg::new();
    let config = TreeSenderConfig::new()
        .allow_multiple_requests(true)
        .max_objects(6);
    let mut sender = TreeSender::with_config("Account", &org, config);
    sender.add_roots(roots.clone()).unwrap();

    let result = sender.commit().unwrap();

    assert!(result.success());
    assert_eq!(result.requests_sent(), 2);
    assert_eq!(result.records_created(), 9);
    assert_eq!(org.body(0)["records"].as_array().unwrap().len(), 2);
    assert_eq!(org.body(1)["records"].as_array().unwrap().len(), 1);
    assert!(roots.iter().all(SObjectRef::is_persisted));
}

#[test]
fn test_single_request_mode_refuses_overflow_before_sending() {
    let roots: Vec<SObjectRef> = (0..2)
        .map(|i| {
            let root = account(&format!("Account {i}"));
            attach(&root, "contacts", &contact("A"), "account");
            root
        })
        .collect();
    let org = FakeOrg::new();
    let mut sender =
        TreeSender::with_config("Account", &org, TreeSenderConfig::new().max_objects(3));
    sender.add_roots(roots).unwrap();

    let err = sender.commit().unwrap_err();

    assert!(matches!(
        err,
        Error::ExceedsLimits(ref limit) if limit.kind == LimitErrorKind::TooManyObjects
    ));
    assert_eq!(err.to_string(), "Cannot have more than 3 objects in one request");
    assert_eq!(org.sent(), 0);
}

#[test]
fn test_oversized_tree_is_refused() {
    let root = account("Big");
    for i in 0..3 {
        attach(&root, "contacts", &contact(&format!("C{i}")), "account");
    }
    let org = FakeOrg::new();
    let config = TreeSenderConfig::new()
        .allow_multiple_requests(true)
        .max_objects(3);
    let mut sender = TreeSender::with_config("Account", &org, config);
    sender.add_root(root).unwrap();

    let err = sender.commit().unwrap_err();
    assert_eq!(err.to_string(), "A tree has more than 3 objects");
    assert_eq!(org.sent(), 0);
}

#[test]
fn test_deep_tree_is_refused() {
    let (acme, _, _) = account_graph("Acme");
    let org = FakeOrg::new();
    let mut sender =
        TreeSender::with_config("Account", &org, TreeSenderConfig::new().max_depth(2));
    sender.add_root(acme).unwrap();

    let err = sender.commit().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Tree with root Account(new) exceeds max depth of 2"
    );
    assert_eq!(org.sent(), 0);
}

#[test]
fn test_rejected_batch_is_reported_and_can_be_retried() {
    let good = account("Good");
    attach(&good, "contacts", &contact("A"), "account");
    let blocked = account("Blocked");
    let blocked_contact = contact("B");
    attach(&blocked, "contacts", &blocked_contact, "account");

    let org = FakeOrg::new().blocking("Blocked");
    let config = TreeSenderConfig::new()
        .allow_multiple_requests(true)
        .max_objects(2);
    let mut sender = TreeSender::with_config("Account", &org, config);
    sender.add_roots([good.clone(), blocked.clone()]).unwrap();

    let result = sender.commit().unwrap();
    assert!(!result.success());
    assert_eq!(result.requests_sent(), 2);
    assert_eq!(result.error_responses().len(), 1);
    let failure = &result.error_responses()[0].results[0];
    assert_eq!(failure.errors[0].message, "Blocked is not allowed");
    assert!(good.is_persisted());
    assert!(!blocked.is_persisted());
    assert!(!blocked_contact.is_persisted());

    set(&blocked, "name", "Fixed");
    let err = sender.commit_checked();
    assert!(err.is_ok(), "retry failed: {err:?}");
    assert_eq!(org.sent(), 3);
    assert_eq!(org.body(2)["records"][0]["Name"], "Fixed");
    assert!(blocked.is_persisted());
    assert_eq!(get_str(&blocked_contact, "account_id"), blocked.id());
}

#[test]
fn test_commit_checked_reports_api_messages() {
    let org = FakeOrg::new().blocking("Blocked");
    let err = send_trees_checked(
        &org,
        "Account",
        [account("Blocked")],
        TreeSenderConfig::default(),
    )
    .unwrap_err();

    let Error::FailedRequest(failed) = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(failed.errors().len(), 1);
    assert!(err.to_string().starts_with("Composite request had errors: "));
    assert!(err.to_string().contains("Blocked is not allowed"));
}

#[test]
fn test_transport_failure_propagates() {
    let org = FakeOrg::new();
    org.set_offline(true);
    let root = account("Acme");
    let mut sender = TreeSender::new("Account", &org);
    sender.add_root(root.clone()).unwrap();

    let err = sender.commit().unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert!(err.to_string().contains("connection refused"));
    assert!(!root.is_persisted());

    org.set_offline(false);
    assert!(sender.commit().unwrap().success());
    assert!(root.is_persisted());
}

#[test]
fn test_roots_must_match_sender_table() {
    let org = FakeOrg::new();
    let mut sender = TreeSender::new("Account", &org);
    let err = sender.add_root(contact("Smith")).unwrap_err();
    assert_eq!(err.to_string(), "All root objects must be Account, got Contact");
    assert!(sender.is_empty());
}
