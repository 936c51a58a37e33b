pub mod filters;
pub mod margin;
pub mod numeric;
pub mod offer;
pub mod output;
pub mod record;
