// Released under MIT License.
// Copyright (c) 2024 David Quigley

//! Small functions for testing purposes.
