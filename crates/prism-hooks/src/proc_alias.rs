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

//! Extension entry point aliases.
//!
//! Applications written against `GL_EXT_framebuffer_object` or the instanced
//! draw extensions ask for the suffixed names. Those are resolved to the core
//! functions instead, so that every call lands on a single hooked entry point.

const ALIASES: &[(&str, &str)] = &[
    // GL_EXT_framebuffer_object
    ("glIsRenderbufferEXT", "glIsRenderbuffer"),
    ("glBindRenderbufferEXT", "glBindRenderbuffer"),
    ("glGenRenderbuffersEXT", "glGenRenderbuffers"),
    ("glDeleteRenderbuffersEXT", "glDeleteRenderbuffers"),
    ("glRenderbufferStorageEXT", "glRenderbufferStorage"),
    ("glGetRenderbufferParameterivEXT", "glGetRenderbufferParameteriv"),
    ("glIsFramebufferEXT", "glIsFramebuffer"),
    ("glBindFramebufferEXT", "glBindFramebuffer"),
    ("glGenFramebuffersEXT", "glGenFramebuffers"),
    ("glDeleteFramebuffersEXT", "glDeleteFramebuffers"),
    ("glCheckFramebufferStatusEXT", "glCheckFramebufferStatus"),
    ("glFramebufferTexture1DEXT", "glFramebufferTexture1D"),
    ("glFramebufferTexture2DEXT", "glFramebufferTexture2D"),
    ("glFramebufferTexture3DEXT", "glFramebufferTexture3D"),
    ("glFramebufferRenderbufferEXT", "glFramebufferRenderbuffer"),
    (
        "glGetFramebufferAttachmentParameterivEXT",
        "glGetFramebufferAttachmentParameteriv",
    ),
    ("glGenerateMipmapEXT", "glGenerateMipmap"),
    // GL_ARB_draw_instanced / GL_EXT_draw_instanced
    ("glDrawArraysInstancedARB", "glDrawArraysInstanced"),
    ("glDrawArraysInstancedEXT", "glDrawArraysInstanced"),
    ("glDrawElementsInstancedARB", "glDrawElementsInstanced"),
    ("glDrawElementsInstancedEXT", "glDrawElementsInstanced"),
];

/// The core name for an extension entry point, if it has one.
pub fn core_alias(name: &str) -> Option<&'static str> {
    ALIASES
        .iter()
        .find(|(extension, _)| *extension == name)
        .map(|(_, core)| *core)
}

/// The name actually looked up for `name`.
pub fn resolve(name: &str) -> &str {
    core_alias(name).unwrap_or(name)
}
