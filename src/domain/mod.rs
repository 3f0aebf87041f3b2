// Domain-layer modules and shared errors/models
pub mod vehicles {
    pub use crate::vehicles::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod repository {
    pub use crate::repository::*;
}

pub mod errors {
    pub use crate::errors::*;
}
