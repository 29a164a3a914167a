pub mod synthetic_outputs;
