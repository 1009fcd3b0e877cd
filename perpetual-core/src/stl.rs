/// STL model parser for binary and ASCII formats
use nom::{
    bytes::complete::{tag, take, take_till},
    character::complete::{multispace0, multispace1},
    combinator::{all_consuming, map},
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{preceded, terminated, tuple},
    IResult,
};

use crate::error::AssetError;
use crate::geometry::{Mesh, Triangle, Vertex};

const HEADER_LEN: usize = 80;

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh, AssetError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(AssetError::Malformed(
            "file too small to be a binary STL".to_string(),
        ));
    }

    match binary_stl(data) {
        Ok((_, mesh)) => Ok(mesh),
        Err(_) => Err(AssetError::Malformed(
            "binary STL ended before its declared facet count".to_string(),
        )),
    }
}

fn binary_stl(input: &[u8]) -> IResult<&[u8], Mesh> {
    let (input, _) = take(HEADER_LEN)(input)?;
    let (input, facet_count) = le_u32(input)?;
    let (input, triangles) = count(binary_facet, facet_count as usize)(input)?;
    Ok((input, mesh_from(triangles)))
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Triangle> {
    let (input, normal) = binary_vector3(input)?;
    let (input, positions) = count(binary_vector3, 3)(input)?;
    // Attribute byte count, unused.
    let (input, _) = le_u16(input)?;

    let vertex = |p: (f32, f32, f32)| Vertex::new(p.0, p.1, p.2, normal.0, normal.1, normal.2);
    Ok((
        input,
        Triangle::new(vertex(positions[0]), vertex(positions[1]), vertex(positions[2])),
    ))
}

fn binary_vector3(input: &[u8]) -> IResult<&[u8], (f32, f32, f32)> {
    tuple((le_f32, le_f32, le_f32))(input)
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh, AssetError> {
    match ascii_stl(input) {
        Ok((_, mesh)) => Ok(mesh),
        Err(e) => Err(AssetError::Malformed(format!("ASCII STL: {e:?}"))),
    }
}

fn ascii_stl(input: &str) -> IResult<&str, Mesh> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _) = take_till(|c: char| c == '\n')(input)?; // Optional name
    let (input, triangles) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    let (input, _) = all_consuming(terminated(take_till(|c: char| c == '\n'), multispace0))(input)?;

    Ok((input, mesh_from(triangles)))
}

fn parse_facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = parse_vertex(input, normal)?;
    let (input, v2) = parse_vertex(input, normal)?;
    let (input, v3) = parse_vertex(input, normal)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, Triangle::new(v1, v2, v3)))
}

fn parse_vertex(input: &str, normal: (f32, f32, f32)) -> IResult<&str, Vertex> {
    map(
        preceded(preceded(multispace0, tag("vertex")), parse_vector3),
        |(x, y, z)| Vertex::new(x, y, z, normal.0, normal.1, normal.2),
    )(input)
}

fn parse_vector3(input: &str) -> IResult<&str, (f32, f32, f32)> {
    tuple((
        preceded(multispace0, float),
        preceded(multispace1, float),
        preceded(multispace1, float),
    ))(input)
}

fn mesh_from(triangles: Vec<Triangle>) -> Mesh {
    let mut mesh = Mesh::with_capacity(triangles.len());
    for triangle in triangles {
        mesh.add_triangle(triangle);
    }
    mesh
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<Mesh, AssetError> {
    // Binary files may also start with "solid", so fall back on failure.
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text) {
                return Ok(mesh);
            }
        }
    }

    parse_binary_stl(data)
}
