mod common;
mod persistence;
mod recommendations;
