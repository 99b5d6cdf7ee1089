//! Integration tests for AddTransformation inside a pulled pipeline
//!
//! ImageStreamer → AddTransformation ← TransformationSource, driven the way
//! an application would: pull the output once, then keep executing until the
//! transformed stream closes.

mod common;

use common::builders::{ImageBuilder, StreamerBuilder};
use common::{assert_transform_eq, test_timeout};
use framestream::data::{
    DataObject, DynamicSequence, Frame, LinearTransformation, StreamEnd, StreamingMode,
};
use framestream::pipeline::{
    AddTransformationNode, FrameSourceNode, NodeId, Pipeline, PipelineError,
    TransformationSourceNode,
};
use framestream::scene::SceneGraph;
use glam::Vec3;
use std::time::Instant;

fn translate(x: f32) -> LinearTransformation {
    LinearTransformation::translation(Vec3::new(x, 0.0, 0.0))
}

struct Graph {
    pipeline: Pipeline,
    streamer: NodeId,
    transform: NodeId,
    add: NodeId,
}

fn streaming_graph(frames: u8, transformation: LinearTransformation) -> Graph {
    let mut pipeline = Pipeline::new();
    let streamer = pipeline.add_node(StreamerBuilder::new("frame_#.img").frames(frames).build());
    let transform = pipeline.add_node(TransformationSourceNode::new(transformation));
    let add = pipeline.add_node(AddTransformationNode::new());

    let frames_out = pipeline.output_port(streamer, 0).unwrap();
    let transform_out = pipeline.output_port(transform, 0).unwrap();
    pipeline.set_input_connection(add, 0, frames_out).unwrap();
    pipeline.set_input_connection(add, 1, transform_out).unwrap();

    Graph {
        pipeline,
        streamer,
        transform,
        add,
    }
}

fn pull(pipeline: &mut Pipeline, node: NodeId) -> DynamicSequence {
    let port = pipeline.output_port(node, 0).unwrap();
    match pipeline.output_data(port).unwrap() {
        DataObject::Sequence(sequence) => sequence,
        other => panic!("expected a sequence, got {}", other.type_name()),
    }
}

/// Execute `node` until `output` closes.
fn run_to_end(pipeline: &mut Pipeline, node: NodeId, output: &DynamicSequence) {
    let deadline = Instant::now() + test_timeout();
    while !output.is_closed() {
        assert!(Instant::now() < deadline, "stream never closed");
        pipeline.execute(node).unwrap();
    }
}

#[test]
fn test_every_streamed_frame_gets_the_transform() {
    let Graph {
        mut pipeline, add, ..
    } = streaming_graph(3, translate(1.0));

    let output = pull(&mut pipeline, add);
    run_to_end(&mut pipeline, add, &output);

    assert_eq!(output.end(), Some(StreamEnd::Exhausted));
    let frames = output.snapshot();
    assert_eq!(frames.len(), 3);
    for (i, frame) in frames.iter().enumerate() {
        assert_eq!(frame.source(), Some(format!("frame_{}.img", i).as_str()));
        let node = frame.scene_graph_node().unwrap();
        assert!(node.is_root());
        assert_eq!(node.transformation(), translate(1.0));
    }
}

#[test]
fn test_output_frames_are_the_streamed_instances() {
    let Graph {
        mut pipeline,
        streamer,
        add,
        ..
    } = streaming_graph(2, LinearTransformation::identity());

    let source = pull(&mut pipeline, streamer);
    source.wait_for_end(test_timeout());
    let output = pull(&mut pipeline, add);
    run_to_end(&mut pipeline, add, &output);

    let streamed = source.snapshot();
    let transformed = output.snapshot();
    assert_eq!(streamed.len(), transformed.len());
    for (a, b) in streamed.iter().zip(&transformed) {
        assert!(Frame::same_instance(a, b));
    }
}

#[test]
fn test_re_execution_replaces_transform_in_place() {
    let Graph {
        mut pipeline,
        transform,
        add,
        ..
    } = streaming_graph(1, translate(1.0));

    let output = pull(&mut pipeline, add);
    run_to_end(&mut pipeline, add, &output);
    let frame = output.latest().unwrap();

    for x in [2.0, 3.0, 4.0] {
        pipeline
            .node_mut(transform)
            .and_then(|n| n.as_transformation_source_mut())
            .unwrap()
            .set_transformation(translate(x));
        pipeline.execute(add).unwrap();
    }

    let node = frame.scene_graph_node().unwrap();
    assert_eq!(node.depth(), 0);
    assert_eq!(node.transformation(), translate(4.0));
    assert_eq!(output.len(), 1);
}

#[test]
fn test_chained_transforms_compose_outermost_last() {
    let mut pipeline = Pipeline::new();
    let streamer = pipeline.add_node(StreamerBuilder::new("c_#").frames(2).build());
    let inner_t = pipeline.add_node(TransformationSourceNode::new(translate(1.0)));
    let outer_t = pipeline.add_node(TransformationSourceNode::new(
        LinearTransformation::scaling(Vec3::splat(2.0)),
    ));
    let inner = pipeline.add_node(AddTransformationNode::new());
    let outer = pipeline.add_node(AddTransformationNode::new());

    let frames_out = pipeline.output_port(streamer, 0).unwrap();
    let inner_t_out = pipeline.output_port(inner_t, 0).unwrap();
    let outer_t_out = pipeline.output_port(outer_t, 0).unwrap();
    let inner_out = pipeline.output_port(inner, 0).unwrap();
    pipeline.set_input_connection(inner, 0, frames_out).unwrap();
    pipeline.set_input_connection(inner, 1, inner_t_out).unwrap();
    pipeline.set_input_connection(outer, 0, inner_out).unwrap();
    pipeline.set_input_connection(outer, 1, outer_t_out).unwrap();

    let output = pull(&mut pipeline, outer);
    run_to_end(&mut pipeline, outer, &output);

    // Each pull runs the upstream chain once.
    assert_eq!(pipeline.executions(inner), pipeline.executions(outer));

    let expected = LinearTransformation::scaling(Vec3::splat(2.0)).multiply(&translate(1.0));
    for frame in output.snapshot() {
        let own = frame.scene_graph_node().unwrap();
        assert_eq!(own.transformation(), translate(1.0));
        let parent = own.parent().unwrap();
        assert!(parent.is_root());
        assert_transform_eq(&SceneGraph::full_transformation(&frame), &expected, 1e-6);
    }
}

#[test]
fn test_newest_frame_only_skips_backlog() {
    let Graph {
        mut pipeline,
        streamer,
        add,
        ..
    } = streaming_graph(5, translate(1.0));
    pipeline
        .set_streaming_mode(add, 0, StreamingMode::NewestFrameOnly)
        .unwrap();

    let source = pull(&mut pipeline, streamer);
    assert_eq!(source.wait_for_end(test_timeout()), Some(StreamEnd::Exhausted));

    let output = pull(&mut pipeline, add);
    assert!(output.is_closed());
    assert_eq!(output.len(), 1);
    assert!(Frame::same_instance(
        &output.latest().unwrap(),
        &source.latest().unwrap()
    ));
    assert!(source.frame(0).unwrap().scene_graph_node().is_none());
}

#[test]
fn test_static_frame_is_not_implemented() {
    let frame = ImageBuilder::new().value(7).frame();
    let mut pipeline = Pipeline::new();
    let source = pipeline.add_node(FrameSourceNode::new(frame.clone()));
    let transform = pipeline.add_node(TransformationSourceNode::new(translate(1.0)));
    let add = pipeline.add_node(AddTransformationNode::new());

    let source_out = pipeline.output_port(source, 0).unwrap();
    let transform_out = pipeline.output_port(transform, 0).unwrap();
    pipeline.set_input_connection(add, 0, source_out).unwrap();
    pipeline.set_input_connection(add, 1, transform_out).unwrap();

    let err = pipeline.execute(add).unwrap_err();
    assert!(err.is_not_implemented());
    assert!(frame.scene_graph_node().is_none());

    let add_out = pipeline.output_port(add, 0).unwrap();
    assert!(matches!(
        pipeline.output_data(add_out),
        Err(PipelineError::NotImplemented(_))
    ));
}

#[test]
fn test_missing_transformation_input() {
    let mut pipeline = Pipeline::new();
    let streamer = pipeline.add_node(StreamerBuilder::new("m_#").frames(1).build());
    let add = pipeline.add_node(AddTransformationNode::new());
    let frames_out = pipeline.output_port(streamer, 0).unwrap();
    pipeline.set_input_connection(add, 0, frames_out).unwrap();

    assert!(matches!(
        pipeline.execute(add),
        Err(PipelineError::MissingInput { port: 1, .. })
    ));
}

#[test]
fn test_topology_describes_graph() {
    let Graph { pipeline, .. } = streaming_graph(1, translate(1.0));

    let json = pipeline.topology().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let names: Vec<_> = value["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        names,
        ["ImageStreamer", "TransformationSource", "AddTransformation"]
    );
    assert_eq!(value["edges"].as_array().unwrap().len(), 2);
    assert_eq!(value["edges"][0]["to_node"], 2);
}
