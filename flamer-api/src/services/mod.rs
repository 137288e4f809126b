pub mod match_engine;
