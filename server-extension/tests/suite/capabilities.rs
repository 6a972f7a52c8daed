use pretty_assertions::assert_eq;
use serde_json::json;
use server_extension::{
    ClientError, Declarations, Extension, ExtensionError, ExtensionRegistry, HostConfig, Params,
    RuntimeClient, capability_accessors,
};
use server_extension_test_support::RecordingTransport;
use server_extension_test_support::{TestHost, params};

struct Widgets;

impl Extension for Widgets {
    fn declare(&self, d: &mut Declarations<'_>) -> server_extension::Result<()> {
        d.command("widgets", |_| Ok(Params::new()))?;
        Ok(())
    }
}

struct Gadgets;

impl Extension for Gadgets {
    fn declare(&self, d: &mut Declarations<'_>) -> server_extension::Result<()> {
        d.resource("gadgets", |_| Ok(Params::new()))?;
        Ok(())
    }
}

struct MoreWidgets;

impl Extension for MoreWidgets {
    fn declare(&self, d: &mut Declarations<'_>) -> server_extension::Result<()> {
        d.command("widgets", |_| Ok(Params::new()))?;
        Ok(())
    }
}

#[test]
fn accessor_forwards_one_request_and_returns_response_unchanged() {
    let mut host = TestHost::default();
    host.registry.load(&Widgets).unwrap();

    let response = params(json!({"items": [1, 2, 3], "nested": {"ok": true}}));
    host.transport.respond("widgets", response.clone());

    let result = host
        .client()
        .call("get_widgets", params(json!({"filter": "blue"})))
        .unwrap();
    assert_eq!(result, response);

    let requests = host.transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].capability, "widgets");
    assert_eq!(requests[0].params, params(json!({"filter": "blue"})));
}

#[test]
fn accessor_handle_matches_call_by_name() {
    let mut host = TestHost::default();
    host.registry.load(&Widgets).unwrap();
    host.transport.respond("widgets", params(json!({"count": 2})));

    let accessor = host.client().accessor("get_widgets").unwrap();
    assert_eq!(accessor.capability(), "widgets");
    assert_eq!(accessor.call(Params::new()).unwrap(), params(json!({"count": 2})));
    assert!(host.client().accessor("get_gadgets").is_none());
}

#[test]
fn distinct_extensions_register_independently() {
    let mut host = TestHost::default();
    host.registry.load(&Widgets).unwrap();
    host.registry.load(&Gadgets).unwrap();

    assert_eq!(host.client().accessor_names(), vec!["get_widgets", "get_gadgets"]);
    assert_eq!(host.registry.capabilities().len(), 2);
}

#[test]
fn same_name_from_another_extension_collides() {
    let mut host = TestHost::default();
    host.registry.load(&Widgets).unwrap();

    let err = host.registry.load(&MoreWidgets).unwrap_err();
    assert!(matches!(err, ExtensionError::DuplicateCapability { ref name } if name == "widgets"));

    // The first registration still answers.
    host.transport.respond("widgets", params(json!({"from": "runtime"})));
    let result = host.client().call("get_widgets", Params::new()).unwrap();
    assert_eq!(result, params(json!({"from": "runtime"})));
    assert_eq!(host.client().accessor_names(), vec!["get_widgets"]);
}

#[test]
fn transport_failures_propagate_through_accessor() {
    let mut host = TestHost::default();
    host.registry.load(&Widgets).unwrap();

    let err = host.client().call("get_widgets", Params::new()).unwrap_err();
    assert!(matches!(
        err,
        ClientError::Transport { ref capability, .. } if capability == "widgets"
    ));
}

#[test]
fn invoke_reaches_capabilities_declared_elsewhere() {
    let host = TestHost::default();
    host.transport.respond("schema", params(json!({"tables": []})));

    let result = host.client().invoke("schema", Params::new()).unwrap();
    assert_eq!(result, params(json!({"tables": []})));
}

#[test]
fn registries_on_one_client_share_the_namespace() {
    let client = RuntimeClient::new(RecordingTransport::new());
    let mut first = ExtensionRegistry::new(HostConfig::default(), client.clone());
    let mut second = ExtensionRegistry::new(HostConfig::default(), client.clone());

    first.load(&Widgets).unwrap();
    let err = second.load(&Widgets).unwrap_err();
    assert!(matches!(err, ExtensionError::DuplicateCapability { ref name } if name == "widgets"));

    assert!(first.capabilities().contains("widgets"));
    assert!(!second.capabilities().contains("widgets"));
    assert_eq!(client.accessor_names(), vec!["get_widgets"]);
}

capability_accessors! {
    trait WidgetAccessors {
        get_widgets => "widgets",
    }
}

#[test]
fn generated_accessors_forward_to_runtime() {
    let host = TestHost::default();
    host.transport.respond("widgets", params(json!({"n": 1})));

    let client: &RuntimeClient = host.client();
    assert_eq!(client.get_widgets(Params::new()).unwrap(), params(json!({"n": 1})));
    assert_eq!(host.transport.requests()[0].capability, "widgets");
}
