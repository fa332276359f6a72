/// Side effects required when an archive is mounted after setup finished.
///
/// A late archive may declare new global classes and new resource ids, so
/// the host's class registry and id cache have to be rebuilt. Neither runs
/// during initial setup.
pub trait MountHooks: Send + Sync {
    fn refresh_global_classes(&self) {}
    fn reload_uid_cache(&self) {}
}

/// Hooks for hosts with no class registry or id cache.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpHooks;

impl MountHooks for NoOpHooks {}
