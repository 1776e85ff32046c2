/// Config for a container
/// ## Fields
/// - `unused_configuration_is_error`:
///   If `true`, a service whose dependency configuration names parameters that its
///   constructor never consults ends with an error instead of a warning.
///
///   Only named overrides of the service's own type are checked,
///   overrides inherited from a generic definition are shared and never reported.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    pub unused_configuration_is_error: bool,
}
