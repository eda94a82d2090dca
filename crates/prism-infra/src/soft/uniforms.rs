// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Uniform variable storage of the software effect runtime.

use prism_core::traits::UniformValues;
use serde::{Deserialize, Serialize};

/// Base type of a uniform variable's elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UniformType {
    /// Stored as 0 or 1.
    Bool,
    /// IEEE 754 single precision.
    Float,
    /// Two's complement 32-bit.
    Int,
    /// Unsigned 32-bit.
    Uint,
}

#[derive(Debug, Clone)]
pub(crate) struct UniformVariable {
    pub(crate) name: String,
    pub(crate) source: Option<String>,
    pub(crate) base_type: UniformType,
    pub(crate) data: Vec<u32>,
}

/// Converts element `i` of `values` into the 32-bit representation of `target`.
fn convert(values: &UniformValues<'_>, i: usize, target: UniformType) -> u32 {
    match (*values, target) {
        (UniformValues::Bool(v), UniformType::Float) => {
            if v[i] { 1.0f32.to_bits() } else { 0 }
        }
        (UniformValues::Bool(v), _) => u32::from(v[i]),
        (UniformValues::Float(v), UniformType::Bool) => u32::from(v[i] != 0.0),
        (UniformValues::Float(v), UniformType::Float) => v[i].to_bits(),
        (UniformValues::Float(v), UniformType::Int) => v[i] as i32 as u32,
        (UniformValues::Float(v), UniformType::Uint) => v[i] as u32,
        (UniformValues::Int(v), UniformType::Bool) => u32::from(v[i] != 0),
        (UniformValues::Int(v), UniformType::Float) => (v[i] as f32).to_bits(),
        (UniformValues::Int(v), _) => v[i] as u32,
        (UniformValues::Uint(v), UniformType::Bool) => u32::from(v[i] != 0),
        (UniformValues::Uint(v), UniformType::Float) => (v[i] as f32).to_bits(),
        (UniformValues::Uint(v), _) => v[i],
    }
}

/// Declared uniform variables, addressed by name or by `source` annotation.
#[derive(Debug, Default)]
pub(crate) struct UniformTable {
    variables: Vec<UniformVariable>,
}

impl UniformTable {
    /// Declares a zero-initialised variable, replacing one of the same name.
    pub(crate) fn declare(
        &mut self,
        name: &str,
        source: Option<&str>,
        base_type: UniformType,
        elements: usize,
    ) {
        let variable = UniformVariable {
            name: name.to_owned(),
            source: source.map(str::to_owned),
            base_type,
            data: vec![0; elements],
        };
        match self.variables.iter_mut().find(|v| v.name == name) {
            Some(existing) => *existing = variable,
            None => self.variables.push(variable),
        }
    }

    /// Writes `values` from element `array_index` on into every variable
    /// annotated with `source`, stopping at each variable's length.
    ///
    /// Returns how many variables were touched.
    pub(crate) fn update(&mut self, source: &str, values: UniformValues<'_>, array_index: usize) -> usize {
        let mut touched = 0;
        for variable in self
            .variables
            .iter_mut()
            .filter(|v| v.source.as_deref() == Some(source))
        {
            let room = variable.data.len().saturating_sub(array_index);
            for i in 0..values.len().min(room) {
                variable.data[array_index + i] = convert(&values, i, variable.base_type);
            }
            touched += 1;
        }
        touched
    }

    pub(crate) fn get(&self, name: &str) -> Option<&UniformVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub(crate) fn len(&self) -> usize {
        self.variables.len()
    }
}

impl UniformVariable {
    pub(crate) fn as_floats(&self) -> Vec<f32> {
        self.data.iter().map(|w| f32::from_bits(*w)).collect()
    }
}
