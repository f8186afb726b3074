pub mod builders;
pub mod mock_collaborators;
pub mod strategies;

#[allow(unused_imports)]
pub use builders::*;
#[allow(unused_imports)]
pub use mock_collaborators::*;
