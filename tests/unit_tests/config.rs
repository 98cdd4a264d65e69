use fermi::quadrature::QuadratureTable;
use fermi::{Backend, ConfigurationError, IntegrationError, Integrator1D, Integrator2D, Integrator3D, IntegratorConfig};

#[test]
fn default_config() {
    let config = IntegratorConfig::default();
    assert_eq!(config.max_level, 12);
    assert_eq!(config.initial_step, 1.0);
    assert_eq!(config.tolerance, 1e-10);
    assert_eq!(config.backend, Backend::Native);
    assert_eq!(config.validate(), Ok(()));
}

#[test]
fn builder_methods_replace_single_settings() {
    let config = IntegratorConfig::default()
        .with_max_level(30)
        .with_initial_step(0.5)
        .with_tolerance(1e-12)
        .with_backend(Backend::Vectorized);

    assert_eq!(
        config,
        IntegratorConfig {
            max_level: 30,
            initial_step: 0.5,
            tolerance: 1e-12,
            backend: Backend::Vectorized,
        }
    );
}

#[test]
fn invalid_configurations_are_rejected() {
    let default = IntegratorConfig::default();

    assert_eq!(
        default.with_max_level(0).validate(),
        Err(ConfigurationError::ZeroMaxLevel)
    );
    assert_eq!(
        default.with_initial_step(0.0).validate(),
        Err(ConfigurationError::NonPositiveStep(0.0))
    );
    assert_eq!(
        default.with_initial_step(-0.5).validate(),
        Err(ConfigurationError::NonPositiveStep(-0.5))
    );
    assert!(default.with_initial_step(f64::INFINITY).validate().is_err());
    assert!(default.with_initial_step(f64::NAN).validate().is_err());
    assert_eq!(
        default.with_tolerance(-1e-8).validate(),
        Err(ConfigurationError::InvalidTolerance(-1e-8))
    );
    assert!(default.with_tolerance(f64::NAN).validate().is_err());

    // A zero tolerance is valid and only stops at round-off level
    assert_eq!(default.with_tolerance(0.0).validate(), Ok(()));
}

#[test]
fn constructors_validate_configuration() {
    let config = IntegratorConfig::default().with_initial_step(-1.0);
    assert_eq!(
        Integrator1D::<f64>::new(config).unwrap_err(),
        ConfigurationError::NonPositiveStep(-1.0)
    );
    assert!(Integrator2D::<f64>::new(config).is_err());
    assert!(Integrator3D::<f64>::new(config).is_err());
    assert_eq!(
        Integrator1D::<f64>::with_max_level(0).unwrap_err(),
        ConfigurationError::ZeroMaxLevel
    );

    let integrator = Integrator1D::<f64>::with_max_level(30).unwrap();
    assert_eq!(integrator.config().max_level, 30);
    assert_eq!(integrator.table().max_level(), 30);
    assert_eq!(integrator.table().initial_step(), 1.0);
}

#[test]
fn max_level_is_limited_by_step_underflow() {
    let default = IntegratorConfig::default();
    assert_eq!(default.with_max_level(1022).validate(), Ok(()));
    assert_eq!(
        default.with_max_level(1023).validate(),
        Err(ConfigurationError::MaxLevelTooLarge { max_level: 1023, limit: 1022 })
    );
    assert_eq!(
        default.with_initial_step(0.5).with_max_level(1022).validate(),
        Err(ConfigurationError::MaxLevelTooLarge { max_level: 1022, limit: 1021 })
    );

    assert_eq!(
        Integrator1D::<f64>::with_max_level(usize::MAX).unwrap_err(),
        ConfigurationError::MaxLevelTooLarge { max_level: usize::MAX, limit: 1022 }
    );
    let config = default.with_max_level(usize::MAX);
    assert!(Integrator2D::<f64>::new(config).is_err());
    assert!(Integrator3D::<f64>::new(config).is_err());
}

#[test]
fn rule_errors_become_step_errors() {
    assert_eq!(
        ConfigurationError::from(fermi_quadrature::Error::InvalidStepSize(0.0)),
        ConfigurationError::NonPositiveStep(0.0)
    );
    assert_eq!(
        QuadratureTable::<f64>::new(-2.0, 4).unwrap_err(),
        ConfigurationError::NonPositiveStep(-2.0)
    );
}

#[test]
fn default_integrators_use_default_config() {
    let integrator = Integrator1D::<f64>::default();
    assert_eq!(integrator.config(), &IntegratorConfig::default());

    let integrator = Integrator2D::<f64>::default();
    assert_eq!(integrator.outer().config(), &IntegratorConfig::default());
    assert_eq!(integrator.inner().config(), &IntegratorConfig::default());

    let integrator = Integrator3D::<f64>::default();
    assert_eq!(integrator.outer().config(), &IntegratorConfig::default());
    assert_eq!(integrator.inner().inner().config(), &IntegratorConfig::default());
}

#[test]
fn invalid_limits_are_configuration_errors() {
    let integrator = Integrator1D::<f64>::default();
    let f = |x: f64| x;

    let error = integrator.integrate(f, 1.0, 1.0).unwrap_err();
    assert!(matches!(
        error,
        IntegrationError::Configuration(ConfigurationError::InvalidInterval { lower, upper })
            if lower == 1.0 && upper == 1.0
    ));

    assert!(matches!(
        integrator.integrate(f, 2.0, 1.0),
        Err(IntegrationError::Configuration(ConfigurationError::InvalidInterval { .. }))
    ));
    assert!(matches!(
        integrator.integrate(f, f64::NAN, 1.0),
        Err(IntegrationError::Configuration(ConfigurationError::InvalidInterval { .. }))
    ));
    assert!(matches!(
        integrator.integrate(f, f64::INFINITY, f64::INFINITY),
        Err(IntegrationError::Configuration(ConfigurationError::InvalidInterval { .. }))
    ));
}

#[test]
fn config_json_roundtrip() {
    let config = IntegratorConfig::default()
        .with_max_level(20)
        .with_backend(Backend::Vectorized);
    let json = serde_json::to_string(&config).unwrap();
    let deserialized: IntegratorConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, config);

    let json = r#"{ "max_level": 8, "initial_step": 0.5, "tolerance": 1e-6, "backend": "Native" }"#;
    let config: IntegratorConfig = serde_json::from_str(json).unwrap();
    assert_eq!(
        config,
        IntegratorConfig {
            max_level: 8,
            initial_step: 0.5,
            tolerance: 1e-6,
            backend: Backend::Native,
        }
    );
}
