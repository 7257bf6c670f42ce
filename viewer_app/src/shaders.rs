//! GLSL sources for the viewer's single program

/// Transforms positions and passes world-space normals through
pub const VERTEX: &str = r"#version 330 core
layout(location = 0) in vec3 position;
layout(location = 1) in vec3 normal;
layout(location = 2) in vec2 tex_coord;

uniform mat4 u_view_projection;
uniform mat4 u_model;

out vec3 v_normal;

void main() {
    v_normal = mat3(u_model) * normal;
    gl_Position = u_view_projection * u_model * vec4(position, 1.0);
}
";

/// Lambert shading against one fixed directional light
pub const FRAGMENT: &str = r"#version 330 core
in vec3 v_normal;

uniform vec3 u_color;

out vec4 frag_color;

void main() {
    vec3 light = normalize(vec3(0.4, 0.8, 0.6));
    float diffuse = max(dot(normalize(v_normal), light), 0.0);
    frag_color = vec4(u_color * (0.2 + 0.8 * diffuse), 1.0);
}
";
