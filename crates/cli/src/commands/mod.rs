mod list;
mod run;

pub use list::ListRecipes;
pub use run::RunCast;
