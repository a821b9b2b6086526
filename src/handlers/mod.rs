pub mod deps;
pub mod health;
pub mod home;

use crate::probes::Dependencies;

pub struct AppState {
    pub deps: Dependencies,
}
