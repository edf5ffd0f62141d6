pub mod methods;
pub mod prepare;
pub mod report;
pub mod run;
