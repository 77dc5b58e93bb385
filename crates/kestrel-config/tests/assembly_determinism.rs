//! Assembly must be a pure function of its inputs.

use std::path::PathBuf;

use rstest::rstest;

use kestrel_config::{
    DEFAULT_RING_CAPACITY, Encryption, Environment, LaunchOverrides, LogLevel, Platform,
    Transport, assemble,
};

fn environment(platform: Platform) -> Environment {
    Environment::new(Some(PathBuf::from("/home/kes")), platform)
}

#[rstest]
#[case(Platform::Linux, "index.html")]
#[case(Platform::MacOs, "custom.html")]
#[case(Platform::Windows, "dev/index.html")]
fn identical_inputs_assemble_identically(#[case] platform: Platform, #[case] homepage: &str) {
    let overrides = LaunchOverrides {
        homepage: homepage.to_owned(),
        ..LaunchOverrides::default()
    };
    let env = environment(platform);

    let first = assemble(&overrides, &env);
    let second = assemble(&overrides, &env);

    assert_eq!(first, second);
}

#[rstest]
fn assembly_is_total_over_defaults() {
    let config = assemble(&LaunchOverrides::default(), &Environment::new(None, Platform::Other));

    assert_eq!(config.window().homepage, "index.html");
    assert_eq!(config.log().ring_capacity, DEFAULT_RING_CAPACITY);
    assert_eq!(config.log().level, LogLevel::Debug);
    assert!(matches!(
        config.daemon().sql.encryption,
        Encryption::Enabled { .. }
    ));
    assert_eq!(config.daemon().rpc.control.port(), 1337);
    assert_eq!(config.daemon().rpc.web.port(), 1339);
    assert!(config.daemon().network.mdns);
    assert!(!config.daemon().network.distributed_storage);
    assert_eq!(
        config
            .daemon()
            .network
            .binds_for(Transport::Datagram)
            .collect::<Vec<_>>(),
        vec!["/ip4/0.0.0.0/udp/0/quic"]
    );
    assert!(config.validate().is_ok());
}

#[rstest]
fn log_directory_differs_per_platform() {
    let overrides = LaunchOverrides::default();
    let mac = assemble(&overrides, &environment(Platform::MacOs));
    let linux = assemble(&overrides, &environment(Platform::Linux));

    assert_ne!(mac.log().directory, linux.log().directory);
    assert!(mac.log().directory.ends_with("Library/Logs/Kestrel"));
}
