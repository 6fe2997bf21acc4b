//! Integration tests for the encode loop against scripted and built-in encoders.


mod end_to_end;
mod flush;
