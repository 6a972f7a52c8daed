//! Two extensions fighting over `ping`.

use pretty_assertions::assert_eq;
use serde_json::json;
use server_extension::{Declarations, Extension, ExtensionError, Params};
use server_extension_test_support::{TestHost, params};

struct A;

impl Extension for A {
    fn declare(&self, d: &mut Declarations<'_>) -> server_extension::Result<()> {
        d.command("ping", |_| Ok(params(json!({"pong": true}))))?;
        Ok(())
    }
}

struct B;

impl Extension for B {
    fn declare(&self, d: &mut Declarations<'_>) -> server_extension::Result<()> {
        d.before_start(|| Ok(()));
        d.command("ping", |_| Ok(Params::new()))?;
        Ok(())
    }
}

#[test]
fn ping_survives_a_second_registration() {
    let mut host = TestHost::default();
    host.registry.load(&A).unwrap();
    host.transport.respond("ping", params(json!({"pong": true})));

    assert_eq!(
        host.client().call("get_ping", Params::new()).unwrap(),
        params(json!({"pong": true}))
    );

    let err = host.registry.load(&B).unwrap_err();
    assert!(matches!(err, ExtensionError::DuplicateCapability { ref name } if name == "ping"));

    // B's hook is a separate registry write and stays effective.
    assert_eq!(host.registry.hooks().start().len(), 1);
    let report = host.registry.start().unwrap();
    assert_eq!(report.ran, 1);

    assert_eq!(
        host.client().call("get_ping", Params::new()).unwrap(),
        params(json!({"pong": true}))
    );
    assert_eq!(host.transport.requests().len(), 2);

    let handler = host.registry.capabilities().handler("ping").unwrap();
    assert_eq!(handler(&Params::new()).unwrap(), params(json!({"pong": true})));
}
